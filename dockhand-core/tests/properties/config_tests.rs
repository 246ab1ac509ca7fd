//! Property tests for configuration builders and settings conversion

use std::time::Duration;

use proptest::prelude::*;

use dockhand_core::config::{CacheSettings, HubSettings, PoolSettings};
use dockhand_core::{CacheConfig, HubConfig, PoolConfig};

proptest! {
    /// Property: PoolConfig builder preserves every field
    #[test]
    fn pool_config_builder_preserves_fields(
        max in 1usize..64,
        reap_secs in 1u64..3600,
        idle_secs in 1u64..7200,
    ) {
        let config = PoolConfig::new()
            .with_max_connections(max)
            .with_reap_interval(Duration::from_secs(reap_secs))
            .with_max_idle_time(Duration::from_secs(idle_secs));

        prop_assert_eq!(config.max_connections, max);
        prop_assert_eq!(config.reap_interval, Duration::from_secs(reap_secs));
        prop_assert_eq!(config.max_idle_time, Duration::from_secs(idle_secs));
    }

    /// Property: PoolSettings converts losslessly into PoolConfig
    #[test]
    fn pool_settings_convert_losslessly(
        max in 1usize..64,
        reap_secs in 1u64..3600,
        idle_secs in 1u64..7200,
    ) {
        let settings = PoolSettings {
            max_connections: max,
            reap_interval_secs: reap_secs,
            max_idle_secs: idle_secs,
        };
        let config = PoolConfig::from(&settings);

        prop_assert_eq!(config.max_connections, max);
        prop_assert_eq!(config.reap_interval.as_secs(), reap_secs);
        prop_assert_eq!(config.max_idle_time.as_secs(), idle_secs);
    }

    /// Property: HubConfig builder preserves the ping interval
    #[test]
    fn hub_config_preserves_ping_interval(secs in 1u64..3600) {
        let config = HubConfig::new().with_ping_interval(Duration::from_secs(secs));
        prop_assert_eq!(config.ping_interval, Duration::from_secs(secs));

        let settings = HubSettings { ping_interval_secs: secs };
        prop_assert_eq!(HubConfig::from(&settings).ping_interval, config.ping_interval);
    }

    /// Property: CacheConfig builder preserves every field
    #[test]
    fn cache_config_builder_preserves_fields(
        sweep_secs in 1u64..3600,
        history_max in 1usize..10_000,
    ) {
        let config = CacheConfig::new()
            .with_sweep_interval(Duration::from_secs(sweep_secs))
            .with_history_max(history_max);

        prop_assert_eq!(config.sweep_interval, Duration::from_secs(sweep_secs));
        prop_assert_eq!(config.history_max, history_max);
    }

    /// Property: CacheSettings ttl() reflects ttl_secs exactly
    #[test]
    fn cache_settings_ttl_round_trips(secs in 0u64..86_400) {
        let settings = CacheSettings {
            ttl_secs: secs,
            ..CacheSettings::default()
        };
        prop_assert_eq!(settings.ttl(), Duration::from_secs(secs));
    }
}
