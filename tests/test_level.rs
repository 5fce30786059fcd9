use rs_log_ng::Level;
use rs_log_ng::loggers::{all_levels, must_parse_level, parse_level};

#[test]
fn names_round_trip() {
    for level in all_levels() {
        assert!(level.is_valid());
        assert_eq!(parse_level(level.as_str()).unwrap(), level);
        assert_eq!(parse_level(level.capital_str()).unwrap(), level);
        assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
    }
    assert_eq!(parse_level("  WARNING\n").unwrap(), Level::WARN);
    assert_eq!(must_parse_level("Trace"), Level::TRACE);
}

#[test]
fn unknown_names_fail_loudly() {
    let err = parse_level("verbose").unwrap_err();
    assert!(err.to_string().contains("verbose"));
    assert!(parse_level("").is_err());
    assert!(std::panic::catch_unwind(|| must_parse_level("nope")).is_err());
}

#[test]
fn enablement_is_monotonic() {
    let levels = all_levels();
    for (t, threshold) in levels.iter().enumerate() {
        for (c, candidate) in levels.iter().enumerate() {
            assert_eq!(threshold.is_enabled(*candidate), c <= t, "{threshold} vs {candidate}");
        }
    }
    for pair in levels.windows(2) {
        let enabled = |t: Level| levels.iter().filter(|l| t.is_enabled(**l)).count();
        assert!(enabled(pair[1]) > enabled(pair[0]));
    }
}

#[test]
fn invalid_levels_are_unknown_and_disabled() {
    for bits in [0, 3, 128, u32::MAX] {
        let level = Level::from_bits(bits);
        assert!(!level.is_valid());
        assert_eq!(level.as_str(), "unknown");
        assert_eq!(level.short_capital_str(), "UNO");
        assert!(!Level::TRACE.is_enabled(level));
        assert!(!level.is_enabled(Level::PANIC));
    }
}

#[test]
fn short_and_colored_forms() {
    let shorts: Vec<_> = all_levels().iter().map(|l| l.short_str()).collect();
    assert_eq!(shorts, ["pnc", "fat", "err", "wan", "inf", "dbg", "tac"]);
    let colored = Level::ERROR.colored_capital_str();
    assert!(colored.starts_with("\x1b[") && colored.contains("ERROR") && colored.ends_with("\x1b[0m"));
}

#[test]
fn serde_uses_names() {
    assert_eq!(serde_json::to_string(&Level::DEBUG).unwrap(), "\"debug\"");
    let level: Level = serde_json::from_str("\"Fatal\"").unwrap();
    assert_eq!(level, Level::FATAL);
    assert!(serde_json::from_str::<Level>("\"loud\"").is_err());
}
