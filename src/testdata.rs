//! JSON-backed test data fixtures.
//!
//! Fixtures live in a configured directory and are read on demand per
//! lookup, so an edited fixture takes effect without restarting the
//! harness. Lookups for missing keys fail fast with
//! [`TestDataError::NotFound`] -- a test asking for data that does not
//! exist is itself broken.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

const USERS_FILE: &str = "users.json";
const PRODUCTS_FILE: &str = "products.json";
const CHECKOUT_FILE: &str = "checkout.json";

/// Errors raised by fixture lookups. A missing key is fatal to the test
/// that requested it.
#[derive(Debug, thiserror::Error)]
pub enum TestDataError {
    #[error("test data not found: '{key}' in {file}")]
    NotFound { file: String, key: String },

    #[error("failed to read test data file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse test data file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A login identity, valid or deliberately invalid.
#[derive(Clone, Debug, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub description: String,
}

/// One catalog product. `key` is the stable kebab-case identifier the
/// app bakes into its `data-test` attributes.
#[derive(Clone, Debug, Deserialize)]
pub struct Product {
    pub name: String,
    pub key: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
}

/// A sort dropdown option and the expectation it implies.
#[derive(Clone, Debug, Deserialize)]
pub struct SortOption {
    pub value: String,
    pub label: String,
}

/// A checkout information payload.
#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutInfo {
    pub first_name: String,
    pub last_name: String,
    pub postal_code: String,
}

#[derive(Deserialize)]
struct UsersFile {
    users: HashMap<String, UserRecord>,
    #[serde(default)]
    invalid_users: HashMap<String, UserRecord>,
}

#[derive(Deserialize)]
struct ProductsFile {
    products: Vec<Product>,
    #[serde(default)]
    sorting_options: Vec<SortOption>,
}

#[derive(Deserialize)]
struct CheckoutFile {
    valid: HashMap<String, CheckoutInfo>,
    #[serde(default)]
    invalid: HashMap<String, CheckoutInfo>,
}

/// Read-only access to the fixture directory.
pub struct TestData {
    dir: PathBuf,
}

impl TestData {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A valid user by fixture key (`standard_user`, `locked_out_user`, ...).
    pub fn user(&self, key: &str) -> Result<UserRecord, TestDataError> {
        let users: UsersFile = self.read(USERS_FILE)?;
        let record = users.users.get(key).cloned().ok_or_else(|| {
            TestDataError::NotFound {
                file: USERS_FILE.to_string(),
                key: key.to_string(),
            }
        })?;
        info!("retrieved user data for: {key}");
        Ok(record)
    }

    /// A deliberately-invalid user by fixture key.
    pub fn invalid_user(&self, key: &str) -> Result<UserRecord, TestDataError> {
        let users: UsersFile = self.read(USERS_FILE)?;
        let record = users.invalid_users.get(key).cloned().ok_or_else(|| {
            TestDataError::NotFound {
                file: USERS_FILE.to_string(),
                key: key.to_string(),
            }
        })?;
        info!("retrieved invalid user data for: {key}");
        Ok(record)
    }

    /// The full expected catalog.
    pub fn products(&self) -> Result<Vec<Product>, TestDataError> {
        let file: ProductsFile = self.read(PRODUCTS_FILE)?;
        Ok(file.products)
    }

    /// A product by display name.
    pub fn product(&self, name: &str) -> Result<Product, TestDataError> {
        self.products()?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| TestDataError::NotFound {
                file: PRODUCTS_FILE.to_string(),
                key: name.to_string(),
            })
    }

    pub fn sorting_options(&self) -> Result<Vec<SortOption>, TestDataError> {
        let file: ProductsFile = self.read(PRODUCTS_FILE)?;
        Ok(file.sorting_options)
    }

    pub fn checkout_valid(&self, key: &str) -> Result<CheckoutInfo, TestDataError> {
        let file: CheckoutFile = self.read(CHECKOUT_FILE)?;
        file.valid
            .get(key)
            .cloned()
            .ok_or_else(|| TestDataError::NotFound {
                file: CHECKOUT_FILE.to_string(),
                key: key.to_string(),
            })
    }

    pub fn checkout_invalid(&self, key: &str) -> Result<CheckoutInfo, TestDataError> {
        let file: CheckoutFile = self.read(CHECKOUT_FILE)?;
        file.invalid
            .get(key)
            .cloned()
            .ok_or_else(|| TestDataError::NotFound {
                file: CHECKOUT_FILE.to_string(),
                key: key.to_string(),
            })
    }

    fn read<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<T, TestDataError> {
        let path = self.dir.join(file);
        let content = read_file(&path)?;
        serde_json::from_str(&content).map_err(|source| TestDataError::Parse {
            path: path.clone(),
            source,
        })
    }
}

fn read_file(path: &Path) -> Result<String, TestDataError> {
    std::fs::read_to_string(path).map_err(|source| TestDataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(USERS_FILE),
            r#"{
                "users": {
                    "standard_user": {
                        "username": "standard_user",
                        "password": "secret_sauce",
                        "description": "Standard user with full access"
                    }
                },
                "invalid_users": {
                    "wrong_password": {
                        "username": "standard_user",
                        "password": "wrong_password"
                    }
                }
            }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(PRODUCTS_FILE),
            r#"{
                "products": [
                    {"name": "Sauce Labs Backpack", "key": "sauce-labs-backpack", "price": 29.99},
                    {"name": "Sauce Labs Bike Light", "key": "sauce-labs-bike-light", "price": 9.99}
                ],
                "sorting_options": [
                    {"value": "az", "label": "Name (A to Z)"},
                    {"value": "lohi", "label": "Price (low to high)"}
                ]
            }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CHECKOUT_FILE),
            r#"{
                "valid": {
                    "default": {"first_name": "Jordan", "last_name": "Tester", "postal_code": "94105"}
                },
                "invalid": {
                    "missing_postal": {"first_name": "Jordan", "last_name": "Tester", "postal_code": ""}
                }
            }"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn known_keys_resolve() {
        let dir = fixture_dir();
        let data = TestData::new(dir.path());

        let user = data.user("standard_user").unwrap();
        assert_eq!(user.password, "secret_sauce");

        let invalid = data.invalid_user("wrong_password").unwrap();
        assert_eq!(invalid.password, "wrong_password");

        assert_eq!(data.products().unwrap().len(), 2);
        assert_eq!(
            data.product("Sauce Labs Backpack").unwrap().key,
            "sauce-labs-backpack"
        );
        assert_eq!(data.checkout_valid("default").unwrap().postal_code, "94105");
    }

    #[test]
    fn missing_key_fails_fast() {
        let dir = fixture_dir();
        let data = TestData::new(dir.path());
        assert!(matches!(
            data.user("nonexistent_user"),
            Err(TestDataError::NotFound { .. })
        ));
        assert!(matches!(
            data.checkout_invalid("nope"),
            Err(TestDataError::NotFound { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let data = TestData::new("/no/such/fixtures");
        assert!(matches!(data.user("any"), Err(TestDataError::Io { .. })));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(USERS_FILE), "{not json").unwrap();
        let data = TestData::new(dir.path());
        assert!(matches!(data.user("any"), Err(TestDataError::Parse { .. })));
    }
}
