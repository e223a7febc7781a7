//! Business logic services

pub mod catalog;
pub mod email;
pub mod loans;
pub mod notifications;
pub mod release;
pub mod requests;
pub mod returns;
pub mod sanctions;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

use self::{email::Mailer, release::ReleaseScheduler};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub requests: requests::RequestsService,
    pub loans: loans::LoansService,
    pub returns: returns::ReturnsService,
    pub sanctions: sanctions::SanctionsService,
    pub notifications: notifications::NotificationsService,
    pub release: ReleaseScheduler,
}

impl Services {
    /// Wire services over one repository, one release scheduler and one mailer
    pub fn new(
        repository: Repository,
        release: ReleaseScheduler,
        mailer: Arc<dyn Mailer>,
        config: &AppConfig,
    ) -> Self {
        Self {
            users: users::UsersService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), release.clone()),
            requests: requests::RequestsService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), config.loans.clone()),
            returns: returns::ReturnsService::new(
                repository.clone(),
                release.clone(),
                config.loans.clone(),
            ),
            sanctions: sanctions::SanctionsService::new(repository.clone()),
            notifications: notifications::NotificationsService::new(
                repository.clone(),
                mailer,
                config.email.clone(),
            ),
            release,
            repository,
        }
    }
}
