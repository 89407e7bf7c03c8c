use serde_json::json;
use types::{
    BuildState, CleanupAction, PlatformError, PlatformErrorEnvelope, ProvisionError,
    VmCreateRequest, VmDeployResponse, init_tracing,
};

#[test]
fn vm_create_request_uses_platform_field_names() {
    let request = VmCreateRequest {
        orka_vm_name: "packer-builder".to_owned(),
        orka_base_image: "base.img".to_owned(),
        orka_image: "packer-builder".to_owned(),
        orka_cpu_core: 6,
        vcpu_count: 6,
        io_boost: true,
        tag: String::new(),
    };
    assert_eq!(
        serde_json::to_value(&request).expect("request should serialize"),
        json!({
            "orka_vm_name": "packer-builder",
            "orka_base_image": "base.img",
            "orka_image": "packer-builder",
            "orka_cpu_core": 6,
            "vcpu_count": 6,
            "io_boost": true
        })
    );
}

#[test]
fn deploy_response_ignores_unknown_fields() {
    let response: VmDeployResponse = serde_json::from_value(json!({
        "message": "Successfully deployed VM",
        "vm_id": "a1b2c3",
        "ip": "10.221.188.11",
        "ssh_port": "8822",
        "vnc_port": "6000",
        "errors": []
    }))
    .expect("deploy response should parse");
    assert_eq!(response.vm_id, "a1b2c3");
    assert_eq!(response.ssh_port, "8822");
}

#[test]
fn error_envelope_exposes_first_non_empty_message() {
    let envelope: PlatformErrorEnvelope = serde_json::from_value(json!({
        "errors": [{"message": "Invalid credentials"}, {"message": "ignored"}]
    }))
    .expect("envelope should parse");
    assert_eq!(envelope.first_message(), Some("Invalid credentials"));

    let empty: PlatformErrorEnvelope =
        serde_json::from_value(json!({})).expect("missing errors should default");
    assert_eq!(empty.first_message(), None);

    let blank: PlatformErrorEnvelope =
        serde_json::from_value(json!({"errors": [{"message": "  "}]})).expect("should parse");
    assert_eq!(blank.first_message(), None);
}

#[test]
fn build_state_reports_endpoint_only_when_complete() {
    let mut state = BuildState::new();
    assert!(state.ssh_endpoint().is_none());
    state.ssh_host = Some("10.0.0.5".to_owned());
    assert!(state.ssh_endpoint().is_none());
    state.ssh_port = Some(22);
    assert_eq!(state.ssh_endpoint(), Some(("10.0.0.5", 22)));
}

#[test]
fn build_state_keeps_latest_error() {
    let mut state = BuildState::new();
    assert!(!state.has_error());
    state.record_error(ProvisionError::UnmappedHost {
        ip: "10.0.0.5".to_owned(),
    });
    state.record_error(ProvisionError::CleanupAction {
        action: CleanupAction::PurgeVm,
        source: PlatformError::HttpStatus {
            operation: "purge_vm",
            status: 500,
            message: "boom".to_owned(),
        },
    });
    assert!(matches!(
        state.error,
        Some(ProvisionError::CleanupAction {
            action: CleanupAction::PurgeVm,
            ..
        })
    ));
}

#[test]
fn provision_error_messages_carry_platform_detail() {
    let error = ProvisionError::Authentication {
        source: PlatformError::HttpStatus {
            operation: "login",
            status: 401,
            message: "Invalid credentials".to_owned(),
        },
    };
    let rendered = error.to_string();
    assert!(rendered.contains("logging into the Orka API"));
    assert!(rendered.contains("Invalid credentials"));
    assert_eq!(CleanupAction::RevokeToken.to_string(), "revoke_token");
}

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
