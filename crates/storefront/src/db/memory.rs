//! In-process storage backend.
//!
//! Backs `STOREFRONT_STORAGE=memory` and the test suites. Semantics match the
//! `PostgreSQL` repositories: unique emails, unique checkout keys,
//! compare-and-set status updates, newest-first order and review listings,
//! review cascade on product delete and merging profile upserts.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;

use tokoku_core::{CheckoutKey, Email, OrderId, OrderStatus, ProductId, ReviewId, Role, UserId};

use super::{
    CatalogStore, CreatedOrder, OrderStore, ProfileStore, RepositoryError, ReviewStore,
    UserStore,
};
use crate::models::{
    NewOrder, NewProduct, NewReview, Order, Product, Profile, ProfileUpdate, Review, User,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, (User, String)>,
    products: BTreeMap<i64, Product>,
    orders: BTreeMap<i64, Order>,
    reviews: BTreeMap<i64, Review>,
    profiles: BTreeMap<i64, Profile>,
    next_user_id: i64,
    next_product_id: i64,
    next_order_id: i64,
    next_review_id: i64,
}

/// Tables held in process memory behind a single lock.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryDatabase {
    /// An empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with
    /// [`RepositoryError::Unavailable`] until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fails while the database is marked unavailable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` after `set_unavailable(true)`.
    pub fn ping(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable);
        }
        Ok(())
    }

    fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
        });
        orders
    }
}

impl OrderStore for MemoryDatabase {
    async fn create_if_absent(&self, order: &NewOrder) -> Result<CreatedOrder, RepositoryError> {
        self.ping()?;
        let mut tables = self.tables.lock().await;

        if let Some(existing) = tables
            .orders
            .values()
            .find(|o| o.checkout_key == order.checkout_key)
        {
            return Ok(CreatedOrder {
                order: existing.clone(),
                created: false,
            });
        }

        tables.next_order_id += 1;
        let id = tables.next_order_id;
        let now = Utc::now();
        let created = Order {
            id: OrderId::new(id),
            owner: order.owner.clone(),
            line_items: order.line_items.clone(),
            total_price: order.total_price,
            status: OrderStatus::PendingPayment,
            checkout_key: order.checkout_key,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(id, created.clone());

        Ok(CreatedOrder {
            order: created,
            created: true,
        })
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.ping()?;
        Ok(self.tables.lock().await.orders.get(&id.as_i64()).cloned())
    }

    async fn get_by_checkout_key(
        &self,
        key: CheckoutKey,
    ) -> Result<Option<Order>, RepositoryError> {
        self.ping()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .values()
            .find(|o| o.checkout_key == key)
            .cloned())
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        self.ping()?;
        let mut tables = self.tables.lock().await;
        let Some(order) = tables.orders.get_mut(&id.as_i64()) else {
            return Ok(None);
        };
        if order.status != expected {
            return Ok(None);
        }
        order.status = new_status;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn list_by_owner(&self, owner: &Email) -> Result<Vec<Order>, RepositoryError> {
        self.ping()?;
        let tables = self.tables.lock().await;
        let mine = tables
            .orders
            .values()
            .filter(|o| &o.owner == owner)
            .cloned()
            .collect();
        Ok(Self::newest_first(mine))
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        self.ping()?;
        let tables = self.tables.lock().await;
        Ok(Self::newest_first(tables.orders.values().cloned().collect()))
    }
}

impl CatalogStore for MemoryDatabase {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.ping()?;
        Ok(self.tables.lock().await.products.values().cloned().collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.ping()?;
        Ok(self.tables.lock().await.products.get(&id.as_i64()).cloned())
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        self.ping()?;
        let mut tables = self.tables.lock().await;
        tables.next_product_id += 1;
        let id = tables.next_product_id;
        let created = Product {
            id: ProductId::new(id),
            title: product.title.trim().to_string(),
            price: product.price,
            image: product.image.clone(),
            description: product.description.clone(),
            created_at: Utc::now(),
        };
        tables.products.insert(id, created.clone());
        Ok(created)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        self.ping()?;
        let mut tables = self.tables.lock().await;
        if tables.products.remove(&id.as_i64()).is_none() {
            return Ok(false);
        }
        tables.reviews.retain(|_, r| r.product_id != id);
        Ok(true)
    }
}

impl ReviewStore for MemoryDatabase {
    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        self.ping()?;
        let tables = self.tables.lock().await;
        let mut reviews: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
        });
        Ok(reviews)
    }

    async fn create_review(
        &self,
        product_id: ProductId,
        author: &Email,
        review: &NewReview,
    ) -> Result<Review, RepositoryError> {
        self.ping()?;
        let mut tables = self.tables.lock().await;
        if !tables.products.contains_key(&product_id.as_i64()) {
            return Err(RepositoryError::NotFound);
        }
        tables.next_review_id += 1;
        let id = tables.next_review_id;
        let created = Review {
            id: ReviewId::new(id),
            product_id,
            author: author.clone(),
            rating: review.rating,
            comment: review.comment.trim().to_string(),
            created_at: Utc::now(),
        };
        tables.reviews.insert(id, created.clone());
        Ok(created)
    }
}

impl ProfileStore for MemoryDatabase {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        self.ping()?;
        Ok(self.tables.lock().await.profiles.get(&user_id.as_i64()).cloned())
    }

    async fn upsert_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        self.ping()?;
        let mut tables = self.tables.lock().await;
        let profile = tables
            .profiles
            .entry(user_id.as_i64())
            .or_insert_with(|| Profile {
                user_id,
                address: None,
                phone: None,
                updated_at: Utc::now(),
            });
        if let Some(address) = &update.address {
            profile.address = Some(address.clone());
        }
        if let Some(phone) = &update.phone {
            profile.phone = Some(phone.clone());
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}

impl UserStore for MemoryDatabase {
    async fn create(
        &self,
        email: &Email,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        self.ping()?;
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|(u, _)| &u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        tables.next_user_id += 1;
        let id = tables.next_user_id;
        let user = User {
            id: UserId::new(id),
            email: email.clone(),
            full_name: full_name.map(String::from),
            role: Role::Customer,
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(id, (user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.get_password_hash(email).await?.map(|(user, _)| user))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        self.ping()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<bool, RepositoryError> {
        self.ping()?;
        let mut tables = self.tables.lock().await;
        let Some((user, _)) = tables.users.values_mut().find(|(u, _)| &u.email == email) else {
            return Ok(false);
        };
        user.role = role;
        Ok(true)
    }
}
