//! Profile use-case service.
//!
//! # Responsibility
//! - Onboarding (create), settings updates, deletion and password checks.
//!
//! # Invariants
//! - Passwords are validated for length before hashing and never stored raw.
//! - Deleting a profile removes its tasks and notifications (storage cascade).

use super::credentials::{hash_password, verify_password};
use super::{ServiceError, ServiceResult};
use crate::clock::Clock;
use crate::model::profile::{validate_password, NewProfile, Profile, ProfileId, ProfilePatch};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::Entity;
use log::info;

pub struct ProfileService<'c, R: ProfileRepository> {
    repo: R,
    clock: &'c dyn Clock,
}

impl<'c, R: ProfileRepository> ProfileService<'c, R> {
    pub fn new(repo: R, clock: &'c dyn Clock) -> Self {
        Self { repo, clock }
    }

    pub fn list_profiles(&self) -> ServiceResult<Vec<Profile>> {
        Ok(self.repo.list_profiles()?)
    }

    pub fn get_profile(&self, id: ProfileId) -> ServiceResult<Profile> {
        self.repo
            .get_profile(id)?
            .ok_or(ServiceError::NotFound {
                entity: Entity::Profile,
                id,
            })
    }

    pub fn create_profile(&self, input: NewProfile) -> ServiceResult<Profile> {
        validate_password(&input.password)?;

        let mut profile = Profile::new(input.name.trim(), self.clock.now_ms());
        profile.avatar = input.avatar;
        profile.theme = input.theme.unwrap_or_default();
        profile.validate()?;
        profile.password_hash = Some(hash_password(&input.password)?);

        self.repo.create_profile(&profile)?;
        info!(
            "event=profile_create module=service status=ok profile_id={}",
            profile.id
        );
        Ok(profile)
    }

    pub fn update_profile(&self, id: ProfileId, patch: ProfilePatch) -> ServiceResult<Profile> {
        let mut profile = self.get_profile(id)?;

        if let Some(name) = patch.name {
            profile.name = name.trim().to_string();
        }
        if let Some(avatar) = patch.avatar {
            profile.avatar = avatar;
        }
        if let Some(theme) = patch.theme {
            profile.theme = theme;
        }
        if let Some(password) = patch.password {
            validate_password(&password)?;
            profile.password_hash = Some(hash_password(&password)?);
        }
        profile.validate()?;
        profile.updated_at = self.clock.now_ms();

        self.repo.update_profile(&profile)?;
        Ok(profile)
    }

    /// Deletes a profile and, through the storage cascade, everything it owns.
    pub fn delete_profile(&self, id: ProfileId) -> ServiceResult<bool> {
        self.repo.delete_profile(id)?;
        info!("event=profile_delete module=service status=ok profile_id={id}");
        Ok(true)
    }

    /// Returns `false` for a wrong password or a profile without credential.
    pub fn verify_password(&self, id: ProfileId, password: &str) -> ServiceResult<bool> {
        let profile = self.get_profile(id)?;
        match profile.password_hash.as_deref() {
            Some(hash) => verify_password(password, hash),
            None => Ok(false),
        }
    }
}
