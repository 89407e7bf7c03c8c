use std::collections::BTreeMap;

use types::{
    ConfigError, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_ORKA_ENDPOINT, DEFAULT_VM_BUILDER_NAME,
    DEFAULT_VM_CPU_CORE, OrkaConfig,
};

fn valid_config() -> OrkaConfig {
    OrkaConfig {
        orka_user: "builder@example.com".to_owned(),
        orka_password: "secret".to_owned(),
        source_image: "90gbigsurssh.img".to_owned(),
        ..OrkaConfig::default()
    }
}

#[test]
fn default_config_uses_documented_defaults() {
    let config = OrkaConfig::default();
    assert_eq!(config.orka_endpoint, DEFAULT_ORKA_ENDPOINT);
    assert_eq!(config.orka_vm_builder_name, DEFAULT_VM_BUILDER_NAME);
    assert_eq!(config.orka_vm_cpu_core, DEFAULT_VM_CPU_CORE);
    assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
    assert!(!config.image_precopy);
    assert!(!config.no_delete_vm);
    assert!(config.orka_node_ip_map.is_empty());
}

#[test]
fn default_config_requires_credentials() {
    let error = OrkaConfig::default()
        .validate()
        .expect_err("default config has no credentials");
    assert_eq!(error, ConfigError::MissingField { field: "orka_user" });
}

#[test]
fn fully_populated_config_is_valid() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn endpoint_must_be_http_url() {
    let config = OrkaConfig {
        orka_endpoint: "ftp://10.0.0.1".to_owned(),
        ..valid_config()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidEndpoint { .. })
    ));

    let config = OrkaConfig {
        orka_endpoint: "not a url".to_owned(),
        ..valid_config()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidEndpoint { .. })
    ));

    let config = OrkaConfig {
        orka_endpoint: "   ".to_owned(),
        ..valid_config()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::MissingField {
            field: "orka_endpoint"
        })
    );
}

#[test]
fn zero_limits_are_rejected() {
    let config = OrkaConfig {
        orka_vm_cpu_core: 0,
        ..valid_config()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidLimit {
            field: "orka_vm_cpu_core",
            value: 0
        })
    );

    let config = OrkaConfig {
        http_timeout_secs: 0,
        ..valid_config()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidLimit {
            field: "http_timeout_secs",
            value: 0
        })
    );
}

#[test]
fn endpoint_validation_ignores_credentials_and_vm_limits() {
    let config = OrkaConfig {
        orka_vm_cpu_core: 0,
        ..OrkaConfig::default()
    };
    assert_eq!(config.validate_endpoint(), Ok(()));

    let config = OrkaConfig {
        orka_endpoint: "ftp://10.221.188.100".to_owned(),
        ..OrkaConfig::default()
    };
    assert!(matches!(
        config.validate_endpoint(),
        Err(ConfigError::InvalidEndpoint { .. })
    ));

    let config = OrkaConfig {
        http_timeout_secs: 0,
        ..OrkaConfig::default()
    };
    assert_eq!(
        config.validate_endpoint(),
        Err(ConfigError::InvalidLimit {
            field: "http_timeout_secs",
            value: 0
        })
    );
}

#[test]
fn precopy_requires_destination_image_unless_image_creation_disabled() {
    let config = OrkaConfig {
        image_precopy: true,
        ..valid_config()
    };
    assert_eq!(config.validate(), Err(ConfigError::MissingPrecopyImageName));

    let config = OrkaConfig {
        image_precopy: true,
        no_create_image: true,
        ..valid_config()
    };
    assert!(!config.precopy_enabled());
    assert!(config.validate().is_ok());

    let config = OrkaConfig {
        image_precopy: true,
        image_name: "builder-copy.img".to_owned(),
        ..valid_config()
    };
    assert!(config.precopy_enabled());
    assert!(config.validate().is_ok());
}

#[test]
fn redacted_config_hides_password_only() {
    let redacted = valid_config().redacted();
    assert_eq!(redacted.orka_password, "<redacted>");
    assert_eq!(redacted.orka_user, "builder@example.com");
}

#[test]
fn config_deserializes_from_toml_with_defaults() {
    let config: OrkaConfig = toml::from_str(
        r#"
        orka_endpoint = "http://10.221.188.20"
        orka_user = "ci@example.com"
        orka_password = "pw"
        source_image = "base.img"
        enable_orka_node_ip_mapping = true

        [orka_node_ip_map]
        "10.221.188.20" = "192.168.1.20"
        "#,
    )
    .expect("config should parse");

    assert_eq!(config.orka_endpoint, "http://10.221.188.20");
    assert_eq!(config.orka_vm_builder_name, DEFAULT_VM_BUILDER_NAME);
    assert!(config.enable_orka_node_ip_mapping);
    assert_eq!(
        config.orka_node_ip_map,
        BTreeMap::from([("10.221.188.20".to_owned(), "192.168.1.20".to_owned())])
    );
    assert!(config.validate().is_ok());
}
