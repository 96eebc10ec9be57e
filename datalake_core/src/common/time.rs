use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, 0 if the clock is set before it.
pub fn now_ms() -> u64 {
    system_time_to_ms(SystemTime::now())
}

pub fn system_time_to_ms(time: SystemTime) -> u64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn it_converts_system_time() {
        assert_eq!(system_time_to_ms(UNIX_EPOCH), 0);
        assert_eq!(system_time_to_ms(UNIX_EPOCH + Duration::from_millis(1_234)), 1_234);
        assert_eq!(system_time_to_ms(UNIX_EPOCH - Duration::from_secs(1)), 0);
    }
}
