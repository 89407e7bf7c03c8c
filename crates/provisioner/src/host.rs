use types::{OrkaConfig, ProvisionError};

/// Address the remote-execution layer should connect to for a deployed VM.
///
/// With node IP mapping enabled the deployed IP must have a non-empty entry
/// in the map.
pub fn resolve_ssh_host(config: &OrkaConfig, deployed_ip: &str) -> Result<String, ProvisionError> {
    if !config.enable_orka_node_ip_mapping {
        return Ok(deployed_ip.to_owned());
    }
    config
        .orka_node_ip_map
        .get(deployed_ip)
        .map(|host| host.trim())
        .filter(|host| !host.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ProvisionError::UnmappedHost {
            ip: deployed_ip.to_owned(),
        })
}

pub fn parse_ssh_port(raw: &str) -> Result<u16, ProvisionError> {
    let trimmed = raw.trim();
    match trimmed.parse::<u16>() {
        Ok(0) => Err(ProvisionError::MalformedResponse {
            field: "ssh_port",
            message: "port 0 is not connectable".to_owned(),
        }),
        Ok(port) => Ok(port),
        Err(error) => Err(ProvisionError::MalformedResponse {
            field: "ssh_port",
            message: format!("`{trimmed}` is not a port number: {error}"),
        }),
    }
}
