//! X.509 certificate parsing utilities.
//!
//! Used at cold start to describe the client certificate the relay will
//! present, so an expired or mis-provisioned keystore shows up in the logs.

use x509_parser::prelude::*;

/// Basic X.509 certificate information extracted from DER-encoded data.
#[derive(Debug, Default)]
pub struct BasicCertInfo {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub valid_from: Option<i64>,
    pub valid_to: Option<i64>,
    pub san: Vec<String>,
}

impl BasicCertInfo {
    /// Whether the certificate is outside its validity window at `now`
    /// (Unix seconds). Unknown bounds are not treated as expired.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.valid_to.is_some_and(|to| now > to) || self.valid_from.is_some_and(|from| now < from)
    }
}

/// Parses basic certificate information from DER-encoded X.509 data.
///
/// Fields that cannot be parsed are left `None` or empty.
pub fn parse_x509_basic(der: &[u8]) -> BasicCertInfo {
    let mut info = BasicCertInfo::default();

    if let Ok((_, cert)) = X509Certificate::from_der(der) {
        // Prefer the CN, fall back to the full distinguished name
        info.subject = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(|s| s.to_string())
            .or_else(|| Some(cert.subject().to_string()));

        info.issuer = cert
            .issuer()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(|s| s.to_string())
            .or_else(|| Some(cert.issuer().to_string()));

        info.valid_from = Some(cert.validity().not_before.timestamp());
        info.valid_to = Some(cert.validity().not_after.timestamp());

        if let Ok(Some(san_ext)) = cert.subject_alternative_name() {
            for name in &san_ext.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => info.san.push(dns.to_string()),
                    GeneralName::URI(uri) => info.san.push(uri.to_string()),
                    GeneralName::RFC822Name(email) => info.san.push(email.to_string()),
                    _ => {}
                }
            }
        }
    }

    info
}
