// Bluetooth serial link to the bot
//
// Provides:
// - Link: the sensor/actuator channel the pilot drives
// - frame: bit-exact wire framing for both directions
// - SerialLink: serialport-backed implementation
// - MockLink: clonable test double with shared buffers

pub mod frame;
mod mock;
pub mod serial;

pub use mock::MockLink;
pub use serial::SerialLink;

/// Raw orientation sample as transmitted by the firmware: two axis readings
/// with the firmware's bias already subtracted.
pub type RawSample = (i16, i16);

/// Error types for link communication
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The bot's sensor/actuator channel. Both directions are best-effort and
/// non-blocking so a control tick never stalls on I/O.
pub trait Link {
    /// Most recent complete orientation sample, or None when nothing new has
    /// arrived since the last call.
    fn read_last(&mut self) -> Result<Option<RawSample>, LinkError>;

    /// Send one wheel command word.
    fn write(&mut self, word: u8) -> Result<(), LinkError>;
}
