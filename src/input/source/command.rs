/// An [InterfaceCommand] is a message that can be sent to a
/// [super::InterfaceDevice] over a channel.
#[derive(Debug, Clone)]
pub enum InterfaceCommand {
    Stop,
}
