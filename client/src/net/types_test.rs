use super::*;

#[test]
fn login_request_serializes_fields() {
    let body = LoginRequest { email: "a@b.com".to_owned(), password: "pw".to_owned() };
    assert_eq!(
        serde_json::to_value(&body).unwrap(),
        serde_json::json!({"email": "a@b.com", "password": "pw"})
    );
}

#[test]
fn login_response_accepts_credential_or_token() {
    let a: LoginResponse = serde_json::from_str(r#"{"success":true,"credential":"h.p.s"}"#).unwrap();
    let b: LoginResponse = serde_json::from_str(r#"{"success":true,"token":"h.p.s"}"#).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.into_credential(), Ok("h.p.s".to_owned()));
}

#[test]
fn failed_login_surfaces_server_message() {
    let resp: LoginResponse = serde_json::from_str(r#"{"success":false,"message":"Account locked"}"#).unwrap();
    assert_eq!(resp.into_credential(), Err("Account locked".to_owned()));
}

#[test]
fn failed_login_without_message_is_generic() {
    let resp: LoginResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
    assert_eq!(resp.into_credential(), Err("Invalid email or password.".to_owned()));
}

#[test]
fn success_without_credential_is_an_error() {
    let resp: LoginResponse = serde_json::from_str(r#"{"success":true,"credential":"  "}"#).unwrap();
    assert!(resp.into_credential().is_err());
}
