/// Position in the inclusive port range the voice application may bind.
///
/// Each failed handshake moves one port up, wrapping from the top of the
/// range back to the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortCycle {
    min: u16,
    max: u16,
    current: u16,
}

impl PortCycle {
    pub fn new(min: u16, max: u16) -> Self {
        let max = max.max(min);
        Self {
            min,
            max,
            current: min,
        }
    }

    pub fn current(&self) -> u16 {
        self.current
    }

    /// Step to the next port and return it.
    pub fn advance(&mut self) -> u16 {
        self.current = if self.current >= self.max {
            self.min
        } else {
            self.current + 1
        };
        self.current
    }
}
