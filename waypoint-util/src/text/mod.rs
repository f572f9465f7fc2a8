use std::borrow::Cow;

use color::Color;
use serde::{Deserialize, Serialize};
use style::Style;

pub mod color;
pub mod style;

/// Represents a text component
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TextComponent(pub TextComponentBase);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TextComponentBase {
    /// The actual text
    #[serde(flatten)]
    pub content: TextContent,
    /// Style of the text. Bold, Italic, underline, Color...
    #[serde(flatten)]
    pub style: Style,
    /// Extra text components
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<TextComponentBase>,
}

impl TextComponent {
    pub fn text<P>(plain: P) -> Self
    where
        P: Into<Cow<'static, str>>,
    {
        Self(TextComponentBase {
            content: TextContent::Text { text: plain.into() },
            style: Style::default(),
            extra: vec![],
        })
    }

    /// A component without content; clients render it as nothing.
    pub fn empty() -> Self {
        Self::text("")
    }

    pub fn translate<K>(key: K, with: Vec<TextComponent>) -> Self
    where
        K: Into<Cow<'static, str>>,
    {
        Self(TextComponentBase {
            content: TextContent::Translate {
                translate: key.into(),
                with: with.into_iter().map(|component| component.0).collect(),
            },
            style: Style::default(),
            extra: vec![],
        })
    }

    pub fn add_child(mut self, child: TextComponent) -> Self {
        self.0.extra.push(child.0);
        self
    }

    pub fn add_text<P>(mut self, text: P) -> Self
    where
        P: Into<Cow<'static, str>>,
    {
        self.0.extra.push(TextComponentBase {
            content: TextContent::Text { text: text.into() },
            style: Style::default(),
            extra: vec![],
        });
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.0.style.color = Some(color);
        self
    }

    pub fn color_named(self, color: color::NamedColor) -> Self {
        self.color(Color::Named(color))
    }

    pub fn bold(mut self) -> Self {
        self.0.style.bold = Some(true);
        self
    }

    pub fn italic(mut self) -> Self {
        self.0.style.italic = Some(true);
        self
    }

    /// The plain text of this component, children excluded. Translation keys
    /// are returned verbatim.
    pub fn get_text(self) -> String {
        match self.0.content {
            TextContent::Text { text } => text.into_owned(),
            TextContent::Translate { translate, .. } => translate.into_owned(),
            TextContent::Keybind { keybind } => keybind.into_owned(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TextContent {
    /// Raw text
    Text { text: Cow<'static, str> },
    /// Translated text
    Translate {
        translate: Cow<'static, str>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        with: Vec<TextComponentBase>,
    },
    /// A keybind identifier
    Keybind { keybind: Cow<'static, str> },
}

#[cfg(test)]
mod test {
    use super::color::NamedColor;
    use super::*;

    #[test]
    fn test_serialize_plain_text() {
        let component = TextComponent::text("Hello");
        assert_eq!(
            serde_json::to_string(&component).unwrap(),
            r#"{"text":"Hello"}"#
        );
    }

    #[test]
    fn test_serialize_styled_text() {
        let component = TextComponent::text("Hello").color_named(NamedColor::Red).bold();
        assert_eq!(
            serde_json::to_string(&component).unwrap(),
            r#"{"text":"Hello","color":"red","bold":true}"#
        );
    }

    #[test]
    fn test_roundtrip_with_children() {
        let component = TextComponent::text("a").add_text("b").add_child(
            TextComponent::text("c").color(Color::Rgb(0x09add3)),
        );
        let json = serde_json::to_string(&component).unwrap();
        let back: TextComponent = serde_json::from_str(&json).unwrap();
        assert_eq!(component, back);
    }

    #[test]
    fn test_deserialize_translate() {
        let component: TextComponent =
            serde_json::from_str(r#"{"translate":"multiplayer.disconnect.generic"}"#).unwrap();
        assert_eq!(component.get_text(), "multiplayer.disconnect.generic");
    }
}
