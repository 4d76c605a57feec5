/// Users recognized by the test session resolver (the bearer token is the user id)
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub fn bearer(user: &str) -> String {
    format!("Bearer {}", user)
}
