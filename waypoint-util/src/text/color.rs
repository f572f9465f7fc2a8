use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Text color
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// The default color for the text will be used, which varies by context
    /// (in some cases, it's white; in others, it's black; in still others, it
    /// is a shade of gray that isn't normally used on text).
    #[default]
    Reset,
    /// RGB color
    Rgb(u32),
    /// One of the 16 named Minecraft colors
    Named(NamedColor),
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Reset => serializer.serialize_str("reset"),
            Self::Rgb(rgb) => serializer.serialize_str(&format!("#{rgb:06X}")),
            Self::Named(color) => color.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        if s == "reset" {
            Ok(Self::Reset)
        } else if let Some(hex) = s.strip_prefix('#') {
            let rgb = u32::from_str_radix(hex, 16)
                .map_err(|_| serde::de::Error::custom("Invalid hex color"))?;
            Ok(Self::Rgb(rgb))
        } else {
            Ok(Self::Named(NamedColor::try_from(s.as_str()).map_err(
                |_| serde::de::Error::custom("Invalid named color"),
            )?))
        }
    }
}

/// Named Minecraft color
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black = 0,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl TryFrom<&str> for NamedColor {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "black" => Ok(Self::Black),
            "dark_blue" => Ok(Self::DarkBlue),
            "dark_green" => Ok(Self::DarkGreen),
            "dark_aqua" => Ok(Self::DarkAqua),
            "dark_red" => Ok(Self::DarkRed),
            "dark_purple" => Ok(Self::DarkPurple),
            "gold" => Ok(Self::Gold),
            "gray" => Ok(Self::Gray),
            "dark_gray" => Ok(Self::DarkGray),
            "blue" => Ok(Self::Blue),
            "green" => Ok(Self::Green),
            "aqua" => Ok(Self::Aqua),
            "red" => Ok(Self::Red),
            "light_purple" => Ok(Self::LightPurple),
            "yellow" => Ok(Self::Yellow),
            "white" => Ok(Self::White),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let json = "\"#09ADD3\"";
        let color: Color = serde_json::from_str(json).unwrap();
        assert_eq!(color, Color::Rgb(0x09add3));
        assert_eq!(serde_json::to_string(&color).unwrap(), json);
    }

    #[test]
    fn test_named_roundtrip() {
        let color: Color = serde_json::from_str("\"light_purple\"").unwrap();
        assert_eq!(color, Color::Named(NamedColor::LightPurple));
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"light_purple\"");
    }
}
