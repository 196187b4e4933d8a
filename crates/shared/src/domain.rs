use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    SuperAdmin,
    Organization,
    Citizen,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::Organization, Role::Citizen];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super-admin",
            Role::Organization => "organization",
            Role::Citizen => "citizen",
        }
    }

    /// Selector label shown on the login form.
    pub fn label(self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin (Government)",
            Role::Organization => "Organization",
            Role::Citizen => "Normal Citizen",
        }
    }

    /// Citizens verify one certificate at a time; bulk intake is reserved
    /// for organizations and government operators.
    pub fn can_bulk_upload(self) -> bool {
        !matches!(self, Role::Citizen)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super-admin" => Ok(Role::SuperAdmin),
            "organization" => Ok(Role::Organization),
            "citizen" => Ok(Role::Citizen),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// The authenticated principal. Persisted verbatim as JSON under the
/// session key, so the field names are part of the stored layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub role: Role,
}

/// Certificate category selected in the first wizard step. The free-form
/// variant round-trips through its `other:<text>` string tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateType {
    Degree,
    Marksheet,
    Diploma,
    Other(String),
}

impl CertificateType {
    /// Display label: the tag with its first letter capitalized, with the
    /// `other:` prefix stripped for custom types.
    pub fn label(&self) -> String {
        let raw = match self {
            CertificateType::Degree => "degree",
            CertificateType::Marksheet => "marksheet",
            CertificateType::Diploma => "diploma",
            CertificateType::Other(text) => text.as_str(),
        };
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateType::Degree => f.write_str("degree"),
            CertificateType::Marksheet => f.write_str("marksheet"),
            CertificateType::Diploma => f.write_str("diploma"),
            CertificateType::Other(text) => write!(f, "other:{text}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown certificate type '{0}'")]
pub struct ParseCertificateTypeError(String);

impl FromStr for CertificateType {
    type Err = ParseCertificateTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "degree" => Ok(CertificateType::Degree),
            "marksheet" => Ok(CertificateType::Marksheet),
            "diploma" => Ok(CertificateType::Diploma),
            "other" => Ok(CertificateType::Other(String::new())),
            other => match other.strip_prefix("other:") {
                Some(text) => Ok(CertificateType::Other(text.to_string())),
                None => Err(ParseCertificateTypeError(other.to_string())),
            },
        }
    }
}

impl Serialize for CertificateType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CertificateType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    #[default]
    Online,
    Offline,
}

impl VerificationMode {
    pub fn label(self) -> &'static str {
        match self {
            VerificationMode::Online => "Online",
            VerificationMode::Offline => "Offline",
        }
    }

    /// Estimated wall time quoted to the user before submission.
    pub fn estimated_processing(self) -> &'static str {
        match self {
            VerificationMode::Online => "2-5 minutes",
            VerificationMode::Offline => "30 seconds",
        }
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationMode::Online => f.write_str("online"),
            VerificationMode::Offline => f.write_str("offline"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown verification mode '{0}'")]
pub struct ParseVerificationModeError(String);

impl FromStr for VerificationMode {
    type Err = ParseVerificationModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(VerificationMode::Online),
            "offline" => Ok(VerificationMode::Offline),
            other => Err(ParseVerificationModeError(other.to_string())),
        }
    }
}

/// External credential registries offered in the bulk step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    Digilocker,
    Nad,
    Abc,
    Custom,
}

impl ApiProvider {
    pub const ALL: [ApiProvider; 4] = [
        ApiProvider::Digilocker,
        ApiProvider::Nad,
        ApiProvider::Abc,
        ApiProvider::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiProvider::Digilocker => "digilocker",
            ApiProvider::Nad => "nad",
            ApiProvider::Abc => "abc",
            ApiProvider::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApiProvider::Digilocker => "DigiLocker API",
            ApiProvider::Nad => "National Academic Depository (NAD)",
            ApiProvider::Abc => "Academic Bank of Credits (ABC)",
            ApiProvider::Custom => "Custom API Endpoint",
        }
    }
}

impl fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown api provider '{0}'")]
pub struct ParseApiProviderError(String);

impl FromStr for ApiProvider {
    type Err = ParseApiProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "digilocker" => Ok(ApiProvider::Digilocker),
            "nad" => Ok(ApiProvider::Nad),
            "abc" => Ok(ApiProvider::Abc),
            "custom" => Ok(ApiProvider::Custom),
            other => Err(ParseApiProviderError(other.to_string())),
        }
    }
}

/// Descriptor for an uploaded file. Only metadata travels through the
/// wizard; file contents stay wherever the caller keeps them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
}

impl FileMeta {
    /// Last dot-separated segment of the name, uppercased. A name with no
    /// dot yields the whole name, matching how uploads are screened.
    pub fn extension(&self) -> String {
        self.name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_uppercase()
    }

    pub fn human_size(&self) -> String {
        const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
        if self.size_bytes == 0 {
            return "0 Bytes".to_string();
        }
        let exponent = (self.size_bytes as f64).log(1024.0).floor() as usize;
        let exponent = exponent.min(UNITS.len() - 1);
        let scaled = self.size_bytes as f64 / 1024f64.powi(exponent as i32);
        format!("{} {}", (scaled * 100.0).round() / 100.0, UNITS[exponent])
    }
}

/// Candidate details entered in the metadata step. `certificate_number`
/// is the only optional field on the certificate itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMetadata {
    pub candidate_name: String,
    pub roll_number: String,
    pub institution: String,
    pub year_of_passing: String,
    pub certificate_number: Option<String>,
}

impl CertificateMetadata {
    /// Name, roll number and institution gate step advancement; year and
    /// certificate number do not.
    pub fn required_complete(&self) -> bool {
        !self.candidate_name.is_empty()
            && !self.roll_number.is_empty()
            && !self.institution.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
