use semver::{BuildMetadata, Version};
use thiserror::Error;

/// Last platform release that issued multiple tokens per user. Sessions on
/// these releases must revoke their token explicitly.
pub const LEGACY_MULTI_TOKEN_MAX_VERSION: Version = Version::new(2, 1, 1);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid platform version `{version}`: {message}")]
pub struct VersionParseError {
    pub version: String,
    pub message: String,
}

/// Parse the version reported by the platform health check.
///
/// Accepts a leading `v` and missing minor/patch components (`2.1` is
/// `2.1.0`). Build metadata is dropped so it never affects ordering.
pub fn parse_platform_version(raw: &str) -> Result<Version, VersionParseError> {
    let trimmed = raw.trim();
    let unprefixed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    let core_end = unprefixed
        .find(['-', '+'])
        .unwrap_or(unprefixed.len());
    let (core, suffix) = unprefixed.split_at(core_end);
    let padding = match core.matches('.').count() {
        0 => ".0.0",
        1 => ".0",
        _ => "",
    };

    let mut version = Version::parse(&format!("{core}{padding}{suffix}")).map_err(|error| {
        VersionParseError {
            version: raw.to_owned(),
            message: error.to_string(),
        }
    })?;
    version.build = BuildMetadata::EMPTY;
    Ok(version)
}

pub fn token_revocation_required(version: &Version) -> bool {
    *version <= LEGACY_MULTI_TOKEN_MAX_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_and_older_releases_require_revocation() {
        for raw in ["2.1.1", "2.1.0", "2.0.9", "1.7.3", "2.1.1-rc.1"] {
            let version = parse_platform_version(raw).expect("version should parse");
            assert!(
                token_revocation_required(&version),
                "`{raw}` uses multi-token auth"
            );
        }
    }

    #[test]
    fn newer_releases_skip_revocation() {
        for raw in ["2.1.2", "2.2.0", "3.0.0", "10.0.0"] {
            let version = parse_platform_version(raw).expect("version should parse");
            assert!(
                !token_revocation_required(&version),
                "`{raw}` uses single-token auth"
            );
        }
    }

    #[test]
    fn short_and_prefixed_versions_are_padded() {
        assert_eq!(
            parse_platform_version("2.1").expect("short version"),
            Version::new(2, 1, 0)
        );
        assert_eq!(
            parse_platform_version("3").expect("major only"),
            Version::new(3, 0, 0)
        );
        assert_eq!(
            parse_platform_version(" v2.1.1 ").expect("prefixed version"),
            Version::new(2, 1, 1)
        );
    }

    #[test]
    fn build_metadata_does_not_move_the_threshold() {
        let version = parse_platform_version("2.1.1+build.42").expect("version with metadata");
        assert_eq!(version, Version::new(2, 1, 1));
        assert!(token_revocation_required(&version));
    }

    #[test]
    fn garbage_versions_are_rejected() {
        for raw in ["", "latest", "2.x.1", "2.1.1.1"] {
            let error = parse_platform_version(raw).expect_err("version should be rejected");
            assert_eq!(error.version, raw);
        }
    }
}
