use cadence_core::timezone::validate_timezone;

/// Detect system timezone
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if !tz.is_empty() && validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}

const COMMON_TIMEZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "America/Sao_Paulo",
    "Europe/London",
    "Europe/Paris",
    "Europe/Berlin",
    "Europe/Istanbul",
    "Asia/Tokyo",
    "Asia/Shanghai",
    "Asia/Kolkata",
    "Asia/Dubai",
    "Australia/Sydney",
    "Pacific/Auckland",
];

/// Suggests timezone names resembling an invalid one
pub fn suggest_timezone(invalid: &str) -> Vec<&'static str> {
    let needle = invalid.trim().to_lowercase();
    let city = needle.rsplit('/').next().unwrap_or(&needle).to_string();

    let suggestions: Vec<&'static str> = COMMON_TIMEZONES
        .iter()
        .copied()
        .filter(|tz| {
            let lower = tz.to_lowercase();
            !city.is_empty() && (lower.contains(&city) || needle.contains(&lower))
        })
        .collect();

    if suggestions.is_empty() {
        COMMON_TIMEZONES.iter().copied().take(5).collect()
    } else {
        suggestions
    }
}
