//! Monotonic time source

/// Free-running microsecond clock
///
/// Must never go backwards. Wrapping is not expected within the lifetime
/// of the firmware (a `u64` of microseconds lasts ~584,000 years).
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin
    fn now_micros(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_micros(&self) -> u64 {
        (**self).now_micros()
    }
}
