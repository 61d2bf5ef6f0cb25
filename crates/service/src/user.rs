//! Client accounts: registration, login and profile updates.

use async_trait::async_trait;
use model::User;
use repository::{RepositoryError, UserRepository};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::ServiceError;
use crate::hash::PasswordHasher;
use crate::validators::{valid_address, valid_email, valid_name, valid_password, valid_phone_number};

/// Editable personal fields of a user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserUpdate {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub address: String,
    pub phone_number: String,
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user_by_id(&self, id: Uuid) -> Result<User, ServiceError>;
    async fn get_user_by_email(&self, email: &str) -> Result<User, ServiceError>;
    /// Validates every field, checks the email is free, hashes the password and stores a new user.
    async fn register(&self, user: &User, password: &str) -> Result<User, ServiceError>;
    /// An unknown email yields `Db(NotFound)`, a bad password [`ServiceError::WrongPassword`].
    async fn login(&self, email: &str, password: &str) -> Result<User, ServiceError>;
    /// `password: None` keeps the stored hash.
    async fn update(&self, id: Uuid, fields: &UserUpdate, password: Option<&str>) -> Result<User, ServiceError>;
}

pub struct UserServiceImpl<U, H> {
    users_repo: U,
    hasher: H,
}

impl<U, H> UserServiceImpl<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    pub fn new(users_repo: U, hasher: H) -> Self {
        Self { users_repo, hasher }
    }

    /// `Ok(None)` when no user owns the email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        match self.users_repo.get_user_by_email(email).await {
            Ok(user) => Ok(Some(user)),
            Err(RepositoryError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Checks the personal fields shared by users and workers.
pub(crate) fn check_personal_data(
    name: &str,
    surname: &str,
    email: &str,
    address: &str,
    phone_number: &str,
) -> Result<(), ServiceError> {
    if !valid_name(name) {
        return Err(ServiceError::InvalidInput("name"));
    }
    if !valid_name(surname) {
        return Err(ServiceError::InvalidInput("surname"));
    }
    if !valid_email(email) {
        return Err(ServiceError::InvalidInput("email"));
    }
    if !valid_address(address) {
        return Err(ServiceError::InvalidInput("address"));
    }
    if !valid_phone_number(phone_number) {
        return Err(ServiceError::InvalidInput("phone number"));
    }
    Ok(())
}

pub(crate) fn check_password(password: &str) -> Result<(), ServiceError> {
    if valid_password(password) {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput("password"))
    }
}

pub(crate) fn hash_password<H: PasswordHasher>(hasher: &H, password: &str) -> Result<String, ServiceError> {
    hasher.get_hash(password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ServiceError::Hash(e.to_string())
    })
}

#[async_trait]
impl<U, H> UserService for UserServiceImpl<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    #[instrument(skip(self))]
    async fn get_user_by_id(&self, id: Uuid) -> Result<User, ServiceError> {
        Ok(self.users_repo.get_user_by_id(id).await?)
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<User, ServiceError> {
        Ok(self.users_repo.get_user_by_email(email).await?)
    }

    #[instrument(skip(self, user, password), fields(email = %user.email))]
    async fn register(&self, user: &User, password: &str) -> Result<User, ServiceError> {
        check_personal_data(&user.name, &user.surname, &user.email, &user.address, &user.phone_number)
            .and_then(|()| check_password(password))
            .inspect_err(|e| error!(error = %e, "Invalid registration data"))?;

        if self.find_by_email(&user.email).await?.is_some() {
            warn!("User with this email already exists");
            return Err(ServiceError::AlreadyExists("User"));
        }

        let user = User {
            id: Uuid::new_v4(),
            password: hash_password(&self.hasher, password)?,
            ..user.clone()
        };
        let user = self
            .users_repo
            .create(&user)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to create user"))?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let Some(user) = self.find_by_email(email).await? else {
            warn!("User with this email does not exist");
            return Err(RepositoryError::NotFound.into());
        };

        if !self.hasher.compare_hash_and_password(&user.password, password) {
            warn!("Wrong password");
            return Err(ServiceError::WrongPassword);
        }

        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    #[instrument(skip(self, fields, password))]
    async fn update(&self, id: Uuid, fields: &UserUpdate, password: Option<&str>) -> Result<User, ServiceError> {
        let mut user = self.users_repo.get_user_by_id(id).await?;

        check_personal_data(&fields.name, &fields.surname, &fields.email, &fields.address, &fields.phone_number)
            .and_then(|()| password.map_or(Ok(()), check_password))
            .inspect_err(|e| error!(error = %e, "Invalid user data"))?;

        user.name = fields.name.clone();
        user.surname = fields.surname.clone();
        user.email = fields.email.clone();
        user.address = fields.address.clone();
        user.phone_number = fields.phone_number.clone();
        if let Some(password) = password {
            user.password = hash_password(&self.hasher, password)?;
        }

        let user = self.users_repo.update(&user).await?;
        info!("User updated");
        Ok(user)
    }
}
