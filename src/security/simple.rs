use super::{AuthResult, Authenticator};
use crate::server::RequestContext;
use crate::value::{Map, Value};

/// Grants every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn name(&self) -> &str {
        "allowAll"
    }

    fn authenticate(&self, _ctx: &RequestContext, _extra_args: &Map) -> AuthResult {
        AuthResult::granted("I do absolutely nothing!")
    }
}

/// Denies every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowNone;

impl Authenticator for AllowNone {
    fn name(&self) -> &str {
        "allowNone"
    }

    fn authenticate(&self, _ctx: &RequestContext, _extra_args: &Map) -> AuthResult {
        AuthResult::denied("I prevent ANYONE from doing anything!")
    }
}

/// Grants requests carrying a fixed secret in a header.
///
/// The header name and expected value come from the builder, or per chain entry from the
/// `headerName` and `keyValue` extra arguments, which take precedence.
#[derive(Debug, Default, Clone)]
pub struct ApiKeyHeader {
    header_name: Option<String>,
    key_value: Option<String>,
}

impl ApiKeyHeader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn key_value(mut self, value: impl Into<String>) -> Self {
        self.key_value = Some(value.into());
        self
    }
}

fn arg(extra_args: &Map, key: &str) -> Option<String> {
    extra_args.get(key).filter(|v| !v.is_null()).map(Value::to_string)
}

impl Authenticator for ApiKeyHeader {
    fn name(&self) -> &str {
        "allowWithApiKeyHeader"
    }

    fn authenticate(&self, ctx: &RequestContext, extra_args: &Map) -> AuthResult {
        let header_name = arg(extra_args, "headerName").or_else(|| self.header_name.clone());
        let key_value = arg(extra_args, "keyValue").or_else(|| self.key_value.clone());
        let (Some(header_name), Some(key_value)) = (header_name, key_value) else {
            return AuthResult::denied("API key authentication is missing 'headerName' or 'keyValue'");
        };

        match ctx.header(&header_name) {
            None => AuthResult::denied(format!(
                "Did not provide a value in the header `{}`",
                header_name
            )),
            Some(given) if given.to_string() != key_value => {
                AuthResult::denied("Given authentication value did not match the expected value.")
            }
            Some(_) => AuthResult::granted("You gave the correct value!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::RawRequest;

    fn ctx_with_key(value: Option<&str>) -> RequestContext {
        let mut raw = RawRequest::new("GET", "/tests/auth-simple");
        if let Some(value) = value {
            raw = raw.with_header("IS-API-KEY", value);
        }
        RequestContext::new(raw).unwrap()
    }

    #[test]
    fn api_key_from_builder() {
        let auth = ApiKeyHeader::new().header_name("is-api-key").key_value("abcd1234");
        let none = Map::new();
        assert!(auth.authenticate(&ctx_with_key(Some("abcd1234")), &none).success);

        let wrong = auth.authenticate(&ctx_with_key(Some("nope")), &none);
        assert!(!wrong.success);
        assert_eq!(
            wrong.message.as_deref(),
            Some("Given authentication value did not match the expected value.")
        );

        let missing = auth.authenticate(&ctx_with_key(None), &none);
        assert_eq!(
            missing.message.as_deref(),
            Some("Did not provide a value in the header `is-api-key`")
        );
    }

    #[test]
    fn extra_args_override_builder() {
        let auth = ApiKeyHeader::new().header_name("X-Other").key_value("zzz");
        let mut args = Map::new();
        args.insert("headerName".into(), Value::from("IS-API-KEY"));
        args.insert("keyValue".into(), Value::from("abcd1234"));
        assert!(auth.authenticate(&ctx_with_key(Some("abcd1234")), &args).success);
    }

    #[test]
    fn numeric_key_values_compare_as_text() {
        let mut args = Map::new();
        args.insert("headerName".into(), Value::from("IS-API-KEY"));
        args.insert("keyValue".into(), Value::Integer(1234));
        assert!(ApiKeyHeader::new()
            .authenticate(&ctx_with_key(Some("1234")), &args)
            .success);
    }
}
