use clap::Parser;

#[derive(Parser, Clone)]
pub struct Config {
    #[clap(flatten)]
    pub events: EventsConfig,
}

#[derive(Parser, Clone)]
pub struct EventsConfig {
    /// Page size of the change feed when the caller doesn't ask for one
    #[clap(env = "MEDSHARE_MAX_EVENTS_DEFAULT", default_value = "20")]
    pub max_events_default: i32,
    /// Hard cap on the change feed page size
    #[clap(env = "MEDSHARE_MAX_EVENTS_MAX", default_value = "100")]
    pub max_events_max: i32,
}

impl Config {
    pub fn from_env() -> Result<Config, clap::Error> {
        // Empty command line arguments, because we want to use ENV fallback
        // or default values if ENV variables are not set.
        Config::try_parse_from([""])
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn test_default_clap_events() {
        let c = Config::from_env().unwrap();
        assert_eq!(20, c.events.max_events_default);
        assert_eq!(100, c.events.max_events_max);
    }
}
