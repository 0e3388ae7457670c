/// The signed-in person scores are recorded for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

impl User {
    pub fn new(name: &str) -> Self {
        Self {
            id: user_id_for(name),
            display_name: name.trim().to_string(),
            photo_url: None,
        }
    }
}

pub trait AuthProvider {
    fn current_user(&self) -> Option<User>;

    /// True while the identity is still being resolved
    fn is_loading(&self) -> bool {
        false
    }
}

/// Stable identifier for a display name: lowercase, runs of anything other than
/// ascii alphanumerics collapsed to a single '-'
pub fn user_id_for(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c.to_ascii_lowercase());
        } else if !id.is_empty() && !id.ends_with('-') {
            id.push('-');
        }
    }
    while id.ends_with('-') {
        id.pop();
    }
    id
}

/// Identity from the configured user name, else the login name in the environment
#[derive(Debug, Clone, Default)]
pub struct LocalAuth {
    user: Option<User>,
}

impl LocalAuth {
    pub fn new(configured_name: Option<&str>) -> Self {
        let env_name = || {
            std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .ok()
        };
        let name = configured_name.map(str::to_string).or_else(env_name);
        Self::from_name(name.as_deref())
    }

    pub fn from_name(name: Option<&str>) -> Self {
        let user = name
            .map(User::new)
            .filter(|u| !u.id.is_empty());
        Self { user }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl AuthProvider for LocalAuth {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }
}
