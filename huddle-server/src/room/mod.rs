mod room;
mod room_command;
mod room_directory;

pub use room_command::RoomCommand;
pub use room_directory::RoomDirectory;
