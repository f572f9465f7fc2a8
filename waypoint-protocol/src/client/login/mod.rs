mod login_disconnect;

pub use login_disconnect::CLoginDisconnect;
