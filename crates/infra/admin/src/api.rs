//! Admin API handlers.
//!
//! Every view reads whole collections and shapes them in memory. Store
//! failures are logged here and handed back to the caller unchanged.

use crate::stats::{recent_activity, ActivityEntry, AnalyticsQuery, AnalyticsReport, DashboardData, GlobalSummary};
use crate::AdminConfig;
use ride_admin_core::error::{AdminError, AdminResult};
use ride_admin_core::time::now_millis;
use ride_admin_core::traits::{DocumentStore, ObjectStore};
use ride_admin_core::{
    AccountType, Document, FieldValue, Fields, MediaType, NewsArticle, Ride, RideCategory,
    RideStatus, User, WithdrawalRequest, WithdrawalStatus,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Dashboard landing page: headline counters and the full activity feed.
#[derive(Debug, Serialize, Deserialize)]
pub struct OverviewResponse {
    pub summary: GlobalSummary,
    pub recent_activity: Vec<ActivityEntry>,
}

/// Filters for the users table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    /// Case-insensitive match against `first last`.
    pub query: Option<String>,
    pub account_type: Option<AccountType>,
}

/// Users page counters, over all users.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total: usize,
    pub drivers: usize,
    pub riders: usize,
    pub active: usize,
}

/// User list response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub stats: UserStats,
}

/// Rides page counters.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RideStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub cancelled: usize,
}

/// Ride list response, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct RideListResponse {
    pub rides: Vec<Ride>,
    pub stats: RideStats,
}

/// Filters for the withdrawal requests table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WithdrawalFilter {
    /// Case-insensitive match against the requester's name or the request id.
    pub query: Option<String>,
    pub account_type: Option<AccountType>,
    pub status: Option<WithdrawalStatus>,
}

/// Withdrawal page counters, over all requests.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalStats {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
}

/// Withdrawal list response.
#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawalListResponse {
    pub requests: Vec<WithdrawalRequest>,
    pub stats: WithdrawalStats,
}

/// News page counters.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsStats {
    pub total: usize,
    pub with_media: usize,
    pub without_media: usize,
    pub total_words: usize,
}

/// News list response, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct NewsListResponse {
    pub articles: Vec<NewsArticle>,
    pub stats: NewsStats,
}

/// Pricing edit for one ride category.
#[derive(Debug, Clone, Deserialize)]
pub struct RideCategoryUpdate {
    pub name: String,
    pub rate_per_kilometer: f64,
    pub surge_charge_rate: f64,
}

/// A file attached to a news article.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Create or edit request for a news article.
#[derive(Debug, Clone, Default)]
pub struct NewsDraft {
    /// Existing article to edit; `None` creates a new one.
    pub id: Option<String>,
    pub headline: String,
    pub article: String,
    pub video_link: String,
    pub instagram_link: String,
    pub twitter_link: String,
    pub linkedin_link: String,
    pub media: Option<MediaUpload>,
}

/// Admin API service.
pub struct AdminApi {
    store: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    config: AdminConfig,
}

impl AdminApi {
    /// Creates a new admin API with the default configuration.
    pub fn new(store: Arc<dyn DocumentStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self::with_config(store, objects, AdminConfig::default())
    }

    /// Creates a new admin API.
    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        config: AdminConfig,
    ) -> Self {
        Self {
            store,
            objects,
            config,
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    async fn read_all(&self, collection: &str) -> AdminResult<Vec<Document>> {
        self.store.list_documents(collection).await.map_err(|e| {
            tracing::error!(collection, error = %e, "Failed to read collection");
            e
        })
    }

    /// Reads users, rides and transactions together.
    ///
    /// The three reads run concurrently and the call fails as a whole if
    /// any of them fails.
    pub async fn load_dashboard(&self) -> AdminResult<DashboardData> {
        let collections = &self.config.collections;
        let (users, rides, transactions) = tokio::try_join!(
            self.read_all(&collections.users),
            self.read_all(&collections.rides),
            self.read_all(&collections.transactions),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Error fetching dashboard data");
            e
        })?;

        tracing::debug!(
            users = users.len(),
            rides = rides.len(),
            transactions = transactions.len(),
            "Loaded dashboard data"
        );
        Ok(DashboardData::from_documents(&rides, &transactions, &users, now_millis()))
    }

    /// Runs the analytics pass over freshly loaded data.
    pub async fn analytics(&self, query: &AnalyticsQuery) -> AdminResult<AnalyticsReport> {
        let data = self.load_dashboard().await?;
        Ok(AnalyticsReport::build(&data, query))
    }

    /// Headline counters and the unfiltered activity feed.
    pub async fn overview(&self, limit: Option<usize>) -> AdminResult<OverviewResponse> {
        let data = self.load_dashboard().await?;
        Ok(OverviewResponse {
            summary: GlobalSummary::compute(&data),
            recent_activity: recent_activity(&data.rides, &data.transactions, limit),
        })
    }

    // ==================== Users ====================

    /// Lists users matching the filter. Counters cover every user.
    pub async fn list_users(&self, filter: &UserFilter) -> AdminResult<UserListResponse> {
        let docs = self.read_all(&self.config.collections.users).await?;
        let users: Vec<User> = docs.iter().map(User::from_document).collect();

        let stats = UserStats {
            total: users.len(),
            drivers: users
                .iter()
                .filter(|u| u.account_type == Some(AccountType::Driver))
                .count(),
            riders: users
                .iter()
                .filter(|u| u.account_type == Some(AccountType::Rider))
                .count(),
            active: users
                .iter()
                .filter(|u| u.account_status.as_deref() == Some("active"))
                .count(),
        };

        let needle = normalized_query(filter.query.as_deref());
        let users = users
            .into_iter()
            .filter(|u| {
                needle
                    .as_deref()
                    .is_none_or(|q| u.full_name().to_lowercase().contains(q))
            })
            .filter(|u| {
                filter
                    .account_type
                    .as_ref()
                    .is_none_or(|t| u.account_type.as_ref() == Some(t))
            })
            .collect();

        Ok(UserListResponse { users, stats })
    }

    /// Sets `createdAt` to now on every user that lacks it.
    ///
    /// Returns how many users were updated.
    pub async fn backfill_user_created_at(&self) -> AdminResult<usize> {
        let collection = &self.config.collections.users;
        let docs = self.read_all(collection).await?;

        let mut updated = 0;
        for doc in docs.iter().filter(|d| d.get("createdAt").is_none()) {
            let mut fields = Fields::new();
            fields.insert("createdAt".to_string(), FieldValue::Timestamp(Utc::now()));
            self.store.update_fields(collection, &doc.id, fields).await?;
            tracing::info!(user = %doc.id, "Added createdAt to user");
            updated += 1;
        }

        tracing::info!(updated, "Finished backfilling user createdAt");
        Ok(updated)
    }

    // ==================== Rides ====================

    /// Lists every ride, newest first.
    pub async fn list_rides(&self) -> AdminResult<RideListResponse> {
        let now = now_millis();
        let docs = self.read_all(&self.config.collections.rides).await?;
        let mut rides: Vec<Ride> = docs.iter().map(|d| Ride::from_document(d, now)).collect();
        rides.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let count = |status: RideStatus| rides.iter().filter(|r| r.status == status).count();
        let stats = RideStats {
            total: rides.len(),
            completed: count(RideStatus::Completed),
            pending: count(RideStatus::Pending),
            cancelled: count(RideStatus::Cancelled),
        };

        Ok(RideListResponse { rides, stats })
    }

    async fn get_ride(&self, id: &str) -> AdminResult<Ride> {
        self.store
            .get_document(&self.config.collections.rides, id)
            .await?
            .map(|doc| Ride::from_document(&doc, now_millis()))
            .ok_or_else(|| AdminError::not_found("ride", "id", id))
    }

    /// Cancels a ride. Completed rides cannot be cancelled; cancelling a
    /// cancelled ride is a no-op.
    pub async fn cancel_ride(&self, id: &str) -> AdminResult<Ride> {
        let ride = self.get_ride(id).await?;
        match ride.status {
            RideStatus::Cancelled => return Ok(ride),
            RideStatus::Completed => {
                return Err(AdminError::transition("ride", id, "ride is already completed"));
            }
            _ => {}
        }

        let mut fields = Fields::new();
        fields.insert(
            "status".to_string(),
            FieldValue::from(RideStatus::Cancelled.as_str()),
        );
        self.store
            .update_fields(&self.config.collections.rides, id, fields)
            .await
            .map_err(|e| {
                tracing::error!(ride = id, error = %e, "Error cancelling ride");
                e
            })?;

        tracing::info!(ride = id, "Cancelled ride");
        self.get_ride(id).await
    }

    // ==================== Ride categories ====================

    /// Lists ride categories in store order.
    pub async fn list_ride_categories(&self) -> AdminResult<Vec<RideCategory>> {
        let docs = self.read_all(&self.config.collections.ride_categories).await?;
        Ok(docs.iter().map(RideCategory::from_document).collect())
    }

    /// Replaces a category's name and rates.
    pub async fn update_ride_category(
        &self,
        id: &str,
        update: RideCategoryUpdate,
    ) -> AdminResult<RideCategory> {
        let name = update.name.trim();
        if name.is_empty() {
            return Err(AdminError::missing("name"));
        }
        for (field, rate) in [
            ("rate_per_kilometer", update.rate_per_kilometer),
            ("surge_charge_rate", update.surge_charge_rate),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(AdminError::invalid(field, "must be a non-negative number"));
            }
        }

        let category = RideCategory {
            id: id.to_string(),
            name: name.to_string(),
            rate_per_kilometer: update.rate_per_kilometer,
            surge_charge_rate: update.surge_charge_rate,
        };

        let mut fields = Fields::new();
        fields.insert("name".to_string(), category.name.clone().into());
        fields.insert("rate_per_kilometer".to_string(), category.rate_per_kilometer.into());
        fields.insert("surge_charge_rate".to_string(), category.surge_charge_rate.into());
        self.store
            .update_fields(&self.config.collections.ride_categories, id, fields)
            .await
            .map_err(|e| {
                tracing::error!(category = id, error = %e, "Error saving ride category");
                e
            })?;

        tracing::info!(
            category = id,
            rate_per_kilometer = category.rate_per_kilometer,
            surge_charge_rate = category.surge_charge_rate,
            "Updated ride category pricing"
        );
        Ok(category)
    }

    // ==================== Withdrawals ====================

    /// Lists withdrawal requests matching the filter. Counters cover every
    /// request.
    pub async fn list_withdrawals(&self, filter: &WithdrawalFilter) -> AdminResult<WithdrawalListResponse> {
        let docs = self.read_all(&self.config.collections.withdrawals).await?;
        let requests: Vec<WithdrawalRequest> =
            docs.iter().map(WithdrawalRequest::from_document).collect();

        let count = |status: WithdrawalStatus| requests.iter().filter(|r| r.status == status).count();
        let stats = WithdrawalStats {
            total: requests.len(),
            approved: count(WithdrawalStatus::Approved),
            rejected: count(WithdrawalStatus::Rejected),
            pending: count(WithdrawalStatus::Pending),
        };

        let needle = normalized_query(filter.query.as_deref());
        let requests = requests
            .into_iter()
            .filter(|r| {
                needle.as_deref().is_none_or(|q| {
                    r.full_name().to_lowercase().contains(q) || r.id.to_lowercase().contains(q)
                })
            })
            .filter(|r| {
                filter
                    .account_type
                    .as_ref()
                    .is_none_or(|t| r.account_type.as_ref() == Some(t))
            })
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .collect();

        Ok(WithdrawalListResponse { requests, stats })
    }

    /// Approves or rejects a pending withdrawal request.
    pub async fn set_withdrawal_status(
        &self,
        id: &str,
        status: WithdrawalStatus,
    ) -> AdminResult<WithdrawalRequest> {
        if status == WithdrawalStatus::Pending {
            return Err(AdminError::invalid("status", "must be approved or rejected"));
        }

        let collection = &self.config.collections.withdrawals;
        let request = self
            .store
            .get_document(collection, id)
            .await?
            .map(|doc| WithdrawalRequest::from_document(&doc))
            .ok_or_else(|| AdminError::not_found("withdrawal request", "id", id))?;

        if request.status != WithdrawalStatus::Pending {
            return Err(AdminError::transition(
                "withdrawal request",
                id,
                format!("request is already {}", request.status.as_str()),
            ));
        }

        let mut fields = Fields::new();
        fields.insert("status".to_string(), FieldValue::from(status.as_str()));
        self.store
            .update_fields(collection, id, fields)
            .await
            .map_err(|e| {
                tracing::error!(request = id, error = %e, "Error updating withdrawal status");
                e
            })?;

        tracing::info!(request = id, status = status.as_str(), "Updated withdrawal status");
        Ok(WithdrawalRequest { status, ..request })
    }

    // ==================== News ====================

    /// Lists news articles, newest first.
    pub async fn list_news(&self) -> AdminResult<NewsListResponse> {
        let docs = self.read_all(&self.config.collections.news).await?;
        let mut articles: Vec<NewsArticle> = docs.iter().map(NewsArticle::from_document).collect();
        // Undated articles sort last.
        articles.sort_by(|a, b| b.sort_time().cmp(&a.sort_time()));

        let with_media = articles.iter().filter(|a| a.has_media()).count();
        let stats = NewsStats {
            total: articles.len(),
            with_media,
            without_media: articles.len() - with_media,
            total_words: articles.iter().map(NewsArticle::word_count).sum(),
        };

        Ok(NewsListResponse { articles, stats })
    }

    /// Creates or edits a news article.
    ///
    /// An uploaded file takes precedence over a video link. When editing
    /// without new media the existing media is kept.
    pub async fn save_news(&self, draft: NewsDraft) -> AdminResult<NewsArticle> {
        if draft.headline.trim().is_empty() {
            return Err(AdminError::missing("headline"));
        }
        if draft.article.trim().is_empty() {
            return Err(AdminError::missing("article"));
        }

        let collection = &self.config.collections.news;
        let existing = match &draft.id {
            Some(id) => Some(
                self.store
                    .get_document(collection, id)
                    .await?
                    .map(|doc| NewsArticle::from_document(&doc))
                    .ok_or_else(|| AdminError::not_found("news", "id", id))?,
            ),
            None => None,
        };

        let upload_type = draft
            .media
            .as_ref()
            .map(|upload| {
                MediaType::from_content_type(&upload.content_type).ok_or_else(|| {
                    AdminError::invalid("media.content_type", "upload an image or video file")
                })
            })
            .transpose()?;

        let (media_url, media_type) = match (&draft.media, upload_type) {
            (Some(upload), Some(media_type)) => {
                let path = self.media_path(&upload.file_name);
                let url = self
                    .objects
                    .upload(&path, upload.bytes.clone(), &upload.content_type)
                    .await
                    .map_err(|e| {
                        tracing::error!(path = %path, error = %e, "Upload failed");
                        e
                    })?;
                (url, media_type)
            }
            _ if !draft.video_link.is_empty() => (draft.video_link.clone(), MediaType::Video),
            _ => existing
                .as_ref()
                .map(|a| (a.media_url.clone(), a.media_type))
                .unwrap_or_default(),
        };

        let now = FieldValue::Timestamp(Utc::now());
        let mut fields = Fields::new();
        fields.insert("headline".to_string(), draft.headline.into());
        fields.insert("article".to_string(), draft.article.into());
        fields.insert("videoLink".to_string(), draft.video_link.into());
        fields.insert("instagramLink".to_string(), draft.instagram_link.into());
        fields.insert("twitterLink".to_string(), draft.twitter_link.into());
        fields.insert("linkedinLink".to_string(), draft.linkedin_link.into());
        fields.insert("mediaURL".to_string(), media_url.into());
        fields.insert("mediaType".to_string(), media_type.as_str().into());
        fields.insert("timestamp".to_string(), now.clone());

        let id = match draft.id {
            Some(id) => {
                self.store.update_fields(collection, &id, fields).await?;
                tracing::info!(news = %id, "News article updated");
                id
            }
            None => {
                fields.insert("createdAt".to_string(), now);
                let id = self.store.insert_document(collection, fields).await?;
                tracing::info!(news = %id, "News article created");
                id
            }
        };

        self.store
            .get_document(collection, &id)
            .await?
            .map(|doc| NewsArticle::from_document(&doc))
            .ok_or_else(|| AdminError::not_found("news", "id", id))
    }

    /// Deletes a news article and, best effort, its stored media.
    ///
    /// Media that cannot be removed (external link, already gone) is
    /// logged and does not stop the document deletion.
    pub async fn delete_news(&self, id: &str) -> AdminResult<()> {
        let collection = &self.config.collections.news;
        let article = self
            .store
            .get_document(collection, id)
            .await?
            .map(|doc| NewsArticle::from_document(&doc))
            .ok_or_else(|| AdminError::not_found("news", "id", id))?;

        if let Some(path) = self.objects.path_from_url(&article.media_url) {
            match self.objects.delete(&path).await {
                Ok(()) => tracing::info!(path = %path, "Deleted news media"),
                Err(e) => tracing::warn!(
                    path = %path,
                    error = %e,
                    "Could not delete news media; deleting article anyway"
                ),
            }
        }

        self.store.delete_document(collection, id).await.map_err(|e| {
            tracing::error!(news = id, error = %e, "Deletion failed");
            e
        })?;
        tracing::info!(news = id, "News article deleted");
        Ok(())
    }

    fn media_path(&self, file_name: &str) -> String {
        let safe: String = file_name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        format!(
            "{}/{}-{}",
            self.config.media_prefix,
            uuid::Uuid::new_v4().simple(),
            safe
        )
    }
}

fn normalized_query(query: Option<&str>) -> Option<String> {
    query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty())
}
