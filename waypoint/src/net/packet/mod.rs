mod handshake;
mod login;
mod status;
