pub mod echo;
pub mod reply;
pub mod shell;

pub use echo::EchoWorker;
pub use reply::ReplyWorker;
pub use shell::ShellWorker;
