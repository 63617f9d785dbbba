use std::collections::BTreeMap;

use crate::config::OpenAiApiConfig;
use crate::error::OpenAiApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_ORGANIZATION: &str = "OpenAI-Organization";
pub const HEADER_USER_AGENT: &str = "User-Agent";

/// Build a deterministic header map for chat-completion requests.
pub fn build_headers(
    config: &OpenAiApiConfig,
    user_agent: Option<&str>,
) -> Result<BTreeMap<String, String>, OpenAiApiError> {
    let mut headers = BTreeMap::new();

    if config.api_key.trim().is_empty() {
        return Err(OpenAiApiError::MissingApiKey);
    }

    headers.insert(
        HEADER_AUTHORIZATION.to_owned(),
        format!("Bearer {}", config.api_key.trim()),
    );
    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    if let Some(organization) = config.organization.as_deref().and_then(non_empty_trimmed) {
        headers.insert(HEADER_ORGANIZATION.to_owned(), organization);
    }

    // A blank explicit agent falls back to the default, not the configured one.
    let user_agent = match user_agent {
        Some(explicit) => non_empty_trimmed(explicit),
        None => config.user_agent.as_deref().and_then(non_empty_trimmed),
    }
    .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), user_agent);

    headers.extend(config.extra_headers.iter().map(|(name, value)| {
        (name.trim().to_ascii_lowercase(), value.trim().to_owned())
    }));

    Ok(headers)
}

fn non_empty_trimmed(value: &str) -> Option<String> {
    Some(value.trim()).filter(|trimmed| !trimmed.is_empty()).map(str::to_owned)
}

fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match HostInfo::detect() {
        Some(host) => format!(
            "openai-cli/{version} ({} {}; {})",
            host.os, host.release, host.arch
        ),
        None => format!("openai-cli/{version}"),
    }
}

/// Operating system facts reported in the default user agent.
struct HostInfo {
    os: String,
    release: String,
    arch: String,
}

impl HostInfo {
    #[cfg(unix)]
    fn detect() -> Option<Self> {
        use std::mem::MaybeUninit;

        let mut uts = MaybeUninit::<libc::utsname>::uninit();
        // SAFETY: `uname` fills the struct when it returns 0.
        if unsafe { libc::uname(uts.as_mut_ptr()) } != 0 {
            return None;
        }
        // SAFETY: checked the return code above.
        let uts = unsafe { uts.assume_init() };

        let host = Self {
            os: c_field(&uts.sysname).to_lowercase(),
            release: c_field(&uts.release),
            arch: normalize_arch(&c_field(&uts.machine)),
        };
        let complete = !(host.os.is_empty() || host.release.is_empty() || host.arch.is_empty());
        complete.then_some(host)
    }

    #[cfg(not(unix))]
    fn detect() -> Option<Self> {
        None
    }
}

#[cfg(unix)]
fn c_field(field: &[libc::c_char]) -> String {
    // SAFETY: `utsname` fields are NUL-terminated within their fixed length.
    unsafe { std::ffi::CStr::from_ptr(field.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

fn normalize_arch(arch: &str) -> String {
    let lowered = arch.to_ascii_lowercase();
    let canonical = match lowered.as_str() {
        "x86_64" | "amd64" => "x64",
        "x86" | "i386" | "i686" => "ia32",
        "aarch64" => "arm64",
        other => other,
    };
    canonical.to_owned()
}
