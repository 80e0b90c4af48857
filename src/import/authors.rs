//! Author resolution
//!
//! Each distinct `dc:creator` of the export's posts is mapped to a destination
//! user, either an existing account picked by the operator or a new one
//! created from an email address. Answers are cached for the whole run.

use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repositories::{UserRepository, UserRepositoryError};
use crate::models::{User, UserRole};
use crate::services::password::{hash_password, random_password};
use crate::wxr::ExportDocument;

use super::console::Console;
use super::error::ImportError;

/// Distinct creators of `post` items, in order of first appearance.
///
/// Names are compared verbatim.
pub fn collect_authors(doc: &ExportDocument) -> Vec<String> {
    let mut authors: Vec<String> = Vec::new();
    for creator in doc.posts().filter_map(|item| item.creator()) {
        if !authors.iter().any(|a| a == creator) {
            authors.push(creator.to_string());
        }
    }
    authors
}

/// Login used for an author: spaces become hyphens
pub fn login_name(author: &str) -> String {
    author.replace(' ', "-")
}

/// Where the operator is in the decision for one author
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ChooseMode,
    PickExisting,
    EnterEmail,
}

/// Interactive author-to-user mapping with a per-run cache
pub struct AuthorResolver {
    users: Arc<dyn UserRepository>,
    resolved: HashMap<String, User>,
}

impl AuthorResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            resolved: HashMap::new(),
        }
    }

    /// User already resolved for `author`
    pub fn get(&self, author: &str) -> Option<&User> {
        self.resolved.get(author)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Resolve every author in order
    pub async fn resolve_all(
        &mut self,
        authors: &[String],
        console: &mut dyn Console,
    ) -> Result<(), ImportError> {
        for author in authors {
            self.resolve(author, console).await?;
        }
        Ok(())
    }

    /// Map `author` to a user, prompting only the first time it is seen
    pub async fn resolve(
        &mut self,
        author: &str,
        console: &mut dyn Console,
    ) -> Result<User, ImportError> {
        if let Some(user) = self.resolved.get(author) {
            return Ok(user.clone());
        }

        let name = login_name(author);
        let user = self.decide(&name, console).await?;
        tracing::info!("Author '{}' mapped to user '{}' (id {})", author, user.username, user.id);

        self.resolved.insert(author.to_string(), user.clone());
        Ok(user)
    }

    async fn decide(&self, name: &str, console: &mut dyn Console) -> Result<User, ImportError> {
        let mut step = Step::ChooseMode;

        loop {
            step = match step {
                Step::ChooseMode => {
                    let prompt = format!(
                        "The author '{}' needs to be migrated to an user:\n\
                         1. Use an existing user ?\n\
                         2. Create a new user ?\n\
                         Please select a choice: ",
                        name
                    );
                    match ask(console, &prompt, name)?.trim() {
                        "1" => Step::PickExisting,
                        "2" => Step::EnterEmail,
                        _ => Step::ChooseMode,
                    }
                }
                Step::PickExisting => {
                    let users = self.users.list_all().await?;
                    if users.is_empty() {
                        console.println("There are no existing users yet.");
                        Step::ChooseMode
                    } else {
                        match pick_existing(&users, name, console)? {
                            Some(user) => return Ok(user),
                            None => Step::ChooseMode,
                        }
                    }
                }
                Step::EnterEmail => {
                    let prompt = format!("2. Please type the email of the '{}' user or 'back': ", name);
                    let answer = ask(console, &prompt, name)?;
                    let email = answer.trim();

                    if email == "back" {
                        Step::ChooseMode
                    } else if email.is_empty() {
                        Step::EnterEmail
                    } else {
                        match self.create_user(name, email).await? {
                            Some(user) => return Ok(user),
                            None => {
                                console.println(&format!(
                                    "The email '{}' belongs to another user, try again.",
                                    email
                                ));
                                Step::EnterEmail
                            }
                        }
                    }
                }
            };
        }
    }

    /// Create an author account. A username conflict means the user already
    /// exists and is returned instead; `None` when only the email collides.
    async fn create_user(&self, name: &str, email: &str) -> Result<Option<User>, ImportError> {
        let password_hash = hash_password(&random_password())?;
        let user = User::new(name.to_string(), email.to_string(), password_hash, UserRole::Author);

        match self.users.create(&user).await {
            Ok(created) => Ok(Some(created)),
            Err(UserRepositoryError::Conflict(_)) => {
                let existing = self.users.get_by_username(name).await?;
                if existing.is_none() {
                    tracing::warn!("Email '{}' is already used by another user", email);
                }
                Ok(existing)
            }
            Err(UserRepositoryError::Internal(e)) => Err(ImportError::InternalError(e)),
        }
    }
}

fn ask(console: &mut dyn Console, prompt: &str, name: &str) -> Result<String, ImportError> {
    console.ask(prompt)?.ok_or_else(|| {
        ImportError::Prompt(format!("input closed while resolving author '{}'", name))
    })
}

/// Ask for one of the listed usernames. `None` when the operator goes back.
fn pick_existing(
    users: &[User],
    name: &str,
    console: &mut dyn Console,
) -> Result<Option<User>, ImportError> {
    let preselected = if users.len() == 1 {
        Some(users[0].username.as_str())
    } else {
        users
            .iter()
            .map(|u| u.username.as_str())
            .find(|username| *username == name)
    };

    let display: Vec<String> = users
        .iter()
        .map(|u| {
            if Some(u.username.as_str()) == preselected {
                format!("[{}]", u.username)
            } else {
                u.username.clone()
            }
        })
        .collect();

    let prompt = format!(
        "1. Select your user, by typing one of these usernames:\n{} or 'back'\nPlease select a choice: ",
        display.join(", ")
    );

    loop {
        let answer = ask(console, &prompt, name)?;

        if let Some(user) = users.iter().find(|u| u.username == answer) {
            return Ok(Some(user.clone()));
        }
        if answer.is_empty() {
            if let Some(default) = preselected {
                return Ok(users.iter().find(|u| u.username == default).cloned());
            }
        }
        if answer.trim() == "back" {
            return Ok(None);
        }
    }
}
