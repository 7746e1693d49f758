pub struct LoginCommand;
pub struct LogoutCommand;

pub(crate) enum SyncCommand {
    Full,
    Partial,
}

struct CommandParser;
