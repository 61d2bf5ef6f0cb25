//! Staff accounts.

use async_trait::async_trait;
use model::Worker;
use repository::{RepositoryError, WorkerRepository};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::ServiceError;
use crate::hash::PasswordHasher;
use crate::user::{check_password, check_personal_data, hash_password};
use crate::validators::valid_role;

/// Editable fields of a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerUpdate {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub address: String,
    pub phone_number: String,
    pub role: i32,
}

#[async_trait]
pub trait WorkerService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<Worker, ServiceError>;
    async fn create(&self, worker: &Worker, password: &str) -> Result<Worker, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
    async fn get_worker_by_id(&self, id: Uuid) -> Result<Worker, ServiceError>;
    async fn get_all_workers(&self) -> Result<Vec<Worker>, ServiceError>;
    /// `password: None` keeps the stored hash.
    async fn update(&self, id: Uuid, fields: &WorkerUpdate, password: Option<&str>) -> Result<Worker, ServiceError>;
    async fn get_workers_by_role(&self, role: i32) -> Result<Vec<Worker>, ServiceError>;
    /// Mean rate of the worker's completed, rated orders; 0 when there are none.
    async fn get_average_order_rate(&self, worker_id: Uuid) -> Result<f64, ServiceError>;
}

pub struct WorkerServiceImpl<W, H> {
    workers_repo: W,
    hasher: H,
}

impl<W, H> WorkerServiceImpl<W, H>
where
    W: WorkerRepository,
    H: PasswordHasher,
{
    pub fn new(workers_repo: W, hasher: H) -> Self {
        Self { workers_repo, hasher }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Worker>, ServiceError> {
        match self.workers_repo.get_worker_by_email(email).await {
            Ok(worker) => Ok(Some(worker)),
            Err(RepositoryError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_role(role: i32) -> Result<(), ServiceError> {
    if valid_role(role) {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput("role"))
    }
}

#[async_trait]
impl<W, H> WorkerService for WorkerServiceImpl<W, H>
where
    W: WorkerRepository,
    H: PasswordHasher,
{
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<Worker, ServiceError> {
        let Some(worker) = self.find_by_email(email).await? else {
            warn!("Worker with this email does not exist");
            return Err(RepositoryError::NotFound.into());
        };

        if !self.hasher.compare_hash_and_password(&worker.password, password) {
            warn!("Wrong password");
            return Err(ServiceError::WrongPassword);
        }

        info!(worker_id = %worker.id, "Worker logged in");
        Ok(worker)
    }

    #[instrument(skip(self, worker, password), fields(email = %worker.email))]
    async fn create(&self, worker: &Worker, password: &str) -> Result<Worker, ServiceError> {
        check_personal_data(&worker.name, &worker.surname, &worker.email, &worker.address, &worker.phone_number)
            .and_then(|()| check_role(worker.role))
            .and_then(|()| check_password(password))
            .inspect_err(|e| error!(error = %e, "Invalid worker data"))?;

        if self.find_by_email(&worker.email).await?.is_some() {
            warn!("Worker with this email already exists");
            return Err(ServiceError::AlreadyExists("Worker"));
        }

        let worker = Worker {
            id: Uuid::new_v4(),
            password: hash_password(&self.hasher, password)?,
            ..worker.clone()
        };
        let worker = self
            .workers_repo
            .create(&worker)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to create worker"))?;

        info!(worker_id = %worker.id, role = worker.display_role(), "Worker created");
        Ok(worker)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.workers_repo.get_worker_by_id(id).await?;
        self.workers_repo
            .delete(id)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to delete worker"))?;
        info!("Worker deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_worker_by_id(&self, id: Uuid) -> Result<Worker, ServiceError> {
        Ok(self.workers_repo.get_worker_by_id(id).await?)
    }

    async fn get_all_workers(&self) -> Result<Vec<Worker>, ServiceError> {
        Ok(self.workers_repo.get_all_workers().await?)
    }

    #[instrument(skip(self, fields, password))]
    async fn update(&self, id: Uuid, fields: &WorkerUpdate, password: Option<&str>) -> Result<Worker, ServiceError> {
        let mut worker = self.workers_repo.get_worker_by_id(id).await?;

        check_personal_data(&fields.name, &fields.surname, &fields.email, &fields.address, &fields.phone_number)
            .and_then(|()| check_role(fields.role))
            .and_then(|()| password.map_or(Ok(()), check_password))
            .inspect_err(|e| error!(error = %e, "Invalid worker data"))?;

        worker.name = fields.name.clone();
        worker.surname = fields.surname.clone();
        worker.email = fields.email.clone();
        worker.address = fields.address.clone();
        worker.phone_number = fields.phone_number.clone();
        worker.role = fields.role;
        if let Some(password) = password {
            worker.password = hash_password(&self.hasher, password)?;
        }

        let worker = self.workers_repo.update(&worker).await?;
        info!("Worker updated");
        Ok(worker)
    }

    #[instrument(skip(self))]
    async fn get_workers_by_role(&self, role: i32) -> Result<Vec<Worker>, ServiceError> {
        Ok(self.workers_repo.get_workers_by_role(role).await?)
    }

    #[instrument(skip(self))]
    async fn get_average_order_rate(&self, worker_id: Uuid) -> Result<f64, ServiceError> {
        self.workers_repo.get_worker_by_id(worker_id).await?;
        Ok(self.workers_repo.get_average_order_rate(worker_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Argon2Hasher;
    use chrono::{Duration, Utc};
    use model::{Order, OrderStatus, WorkerRole};
    use repository::{InMemoryStore, InMemoryWorkerRepository, OrderRepository};

    fn service(store: &InMemoryStore) -> WorkerServiceImpl<InMemoryWorkerRepository, Argon2Hasher> {
        WorkerServiceImpl::new(store.workers(), Argon2Hasher)
    }

    fn sample(email: &str, role: WorkerRole) -> Worker {
        Worker {
            id: Uuid::nil(),
            name: "Petr".into(),
            surname: "Petrov".into(),
            address: "Lenina 1".into(),
            phone_number: "+79997654321".into(),
            email: email.into(),
            role: role.code(),
            password: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_login_and_roles() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let master = service.create(&sample("petr@example.com", WorkerRole::Master), "master123").await.unwrap();
        service.create(&sample("boss@example.com", WorkerRole::Manager), "manager123").await.unwrap();

        assert_eq!(service.login("petr@example.com", "master123").await.unwrap().id, master.id);
        assert!(matches!(service.login("petr@example.com", "nope1234").await, Err(ServiceError::WrongPassword)));
        assert!(matches!(
            service.create(&sample("petr@example.com", WorkerRole::Master), "master123").await,
            Err(ServiceError::AlreadyExists("Worker"))
        ));

        let mut bad_role = sample("x@example.com", WorkerRole::Master);
        bad_role.role = 3;
        assert!(matches!(service.create(&bad_role, "master123").await, Err(ServiceError::InvalidInput("role"))));

        let masters = service.get_workers_by_role(WorkerRole::Master.code()).await.unwrap();
        assert_eq!(masters.len(), 1);
        assert_eq!(service.get_all_workers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let worker = service.create(&sample("petr@example.com", WorkerRole::Master), "master123").await.unwrap();

        let fields = WorkerUpdate {
            name: "Petr".into(),
            surname: "Sidorov".into(),
            email: "petr@example.com".into(),
            address: "Lenina 1".into(),
            phone_number: "+79997654321".into(),
            role: WorkerRole::Manager.code(),
        };
        let updated = service.update(worker.id, &fields, None).await.unwrap();
        assert_eq!(updated.role(), Some(WorkerRole::Manager));
        assert_eq!(updated.password, worker.password);

        service.delete(worker.id).await.unwrap();
        assert!(service.delete(worker.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_average_order_rate() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let worker = service.create(&sample("petr@example.com", WorkerRole::Master), "master123").await.unwrap();
        assert_eq!(service.get_average_order_rate(worker.id).await.unwrap(), 0.0);

        let orders = store.orders();
        for (status, rate) in [
            (OrderStatus::Completed, 5),
            (OrderStatus::Completed, 4),
            (OrderStatus::Completed, 0),
            (OrderStatus::Cancelled, 1),
        ] {
            let mut order = Order::new(Uuid::new_v4(), "Street 1", Utc::now() + Duration::days(1));
            order.worker_id = Some(worker.id);
            order.status = status;
            order.rate = rate;
            orders.create(&order, &[]).await.unwrap();
        }

        assert_eq!(service.get_average_order_rate(worker.id).await.unwrap(), 4.5);
        assert!(service.get_average_order_rate(Uuid::new_v4()).await.unwrap_err().is_not_found());
    }
}
