/// Delay and sound timers
///
/// Both count down to zero, one unit per tick. The host is expected to tick
/// them at a fixed rate (60Hz on the COSMAC VIP), independently of the
/// instruction rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    /// Decrement each timer which is not already zero
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// The buzzer plays as long as the sound timer is running
    #[must_use]
    pub fn is_sounding(&self) -> bool {
        self.sound > 0
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn tick_test() {
        let mut timers = Timers { delay: 2, sound: 1 };
        assert!(timers.is_sounding());

        timers.tick();
        assert_eq!(timers, Timers { delay: 1, sound: 0 });
        assert!(!timers.is_sounding());

        timers.tick();
        timers.tick();
        assert_eq!(timers, Timers::default());
    }
}
