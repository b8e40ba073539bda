use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Branch, BranchSharingInfo, PopulatedBranch, User};
use crate::database::store::Store;

#[derive(Debug, thiserror::Error)]
pub enum BranchError {
    #[error("user {0} not found")]
    UserNotFound(Uuid),
    #[error("branch {0} not found")]
    BranchNotFound(Uuid),
    #[error("no user registered with email {0}")]
    RecipientNotFound(String),
    #[error("author {0} of the latest note not found")]
    NoteAuthorNotFound(Uuid),
    #[error("a branch cannot be shared with its author")]
    SelfShare,
    #[error("branch is already shared with this user")]
    AlreadyShared,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Window over a sorted listing: entries `[skip, skip + limit)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub skip: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchEntry {
    /// Email of the latest note's author; `None` for branches without notes
    pub email: Option<String>,
    pub branch: PopulatedBranch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BranchPage {
    Entries(Vec<BranchEntry>),
    /// `skip` is past the last branch
    Exhausted,
}

/// Write permission is granted only for the literal `"write"`
pub fn grants_write(permission: Option<&str>) -> bool {
    permission == Some("write")
}

/// Newest latest note first; branches without a note go last. Stable.
pub fn sort_by_latest_note(branches: &mut [PopulatedBranch]) {
    branches.sort_by(|a, b| b.note_updated_at().cmp(&a.note_updated_at()));
}

pub fn paginate<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    items.into_iter().skip(page.skip).take(page.limit).collect()
}

#[derive(Clone)]
pub struct BranchService {
    store: Arc<dyn Store>,
}

impl BranchService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_branch(&self, user_id: Uuid) -> Result<(Branch, User), BranchError> {
        let (branch, user) = self.store.create_branch(user_id).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => BranchError::UserNotFound(user_id),
            other => other.into(),
        })?;

        info!("Created branch {} for user {}", branch.id, user_id);
        Ok((branch, user))
    }

    pub async fn get_branch(&self, branch_id: Uuid) -> Result<Branch, BranchError> {
        self.store
            .find_branch(branch_id)
            .await?
            .ok_or(BranchError::BranchNotFound(branch_id))
    }

    /// Owned and shared branches, newest activity first
    pub async fn list_branches(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<BranchPage, BranchError> {
        let user = self.load_user(user_id).await?;

        let owned = self.resolve_branches(&user.my_branches).await?;
        let grants = self.resolve_sharing_infos(&user.shared_branches_info).await?;
        let shared_ids: Vec<Uuid> = grants.iter().map(|grant| grant.branch_id).collect();
        let shared = self.resolve_branches(&shared_ids).await?;

        let merged = owned.into_iter().chain(shared).collect();
        let mut branches = self.attach_latest_notes(merged).await?;
        sort_by_latest_note(&mut branches);

        if page.skip >= branches.len() {
            debug!("skip {} past {} branches for user {}", page.skip, branches.len(), user_id);
            return Ok(BranchPage::Exhausted);
        }

        let entries = self.attach_author_emails(paginate(branches, page)).await?;
        Ok(BranchPage::Entries(entries))
    }

    /// Owned branches that have never been shared; an out-of-range
    /// `skip` yields an empty page
    pub async fn list_private_branches(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<BranchEntry>, BranchError> {
        let user = self.load_user(user_id).await?;

        let unshared: Vec<Branch> = self
            .resolve_branches(&user.my_branches)
            .await?
            .into_iter()
            .filter(|branch| !branch.is_shared())
            .collect();

        let mut branches = self.attach_latest_notes(unshared).await?;
        sort_by_latest_note(&mut branches);

        self.attach_author_emails(paginate(branches, page)).await
    }

    pub async fn share_branch(
        &self,
        branch_id: Uuid,
        email: &str,
        permission: Option<&str>,
    ) -> Result<BranchSharingInfo, BranchError> {
        let recipient = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| BranchError::RecipientNotFound(email.to_string()))?;
        let branch = self.get_branch(branch_id).await?;

        if self.is_author(&branch, email).await? {
            return Err(BranchError::SelfShare);
        }
        if self.is_already_shared(&branch, recipient.id).await? {
            return Err(BranchError::AlreadyShared);
        }

        let info = self
            .store
            .create_sharing_info(branch.id, recipient.id, grants_write(permission))
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent grant for the same pair
                DatabaseError::Conflict(_) => BranchError::AlreadyShared,
                DatabaseError::NotFound(_) => BranchError::BranchNotFound(branch_id),
                other => other.into(),
            })?;

        info!(
            "Shared branch {} with user {} (write: {})",
            branch.id, recipient.id, info.has_permission
        );
        Ok(info)
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, BranchError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(BranchError::UserNotFound(user_id))
    }

    async fn is_author(&self, branch: &Branch, email: &str) -> Result<bool, BranchError> {
        let author = self.store.find_branch_author(branch.id).await?;
        Ok(author.is_some_and(|author| author.email == email))
    }

    async fn is_already_shared(
        &self,
        branch: &Branch,
        recipient_id: Uuid,
    ) -> Result<bool, BranchError> {
        let grants = self.resolve_sharing_infos(&branch.shared_users_info).await?;
        Ok(grants.iter().any(|grant| grant.user_id == recipient_id))
    }

    async fn resolve_branches(&self, ids: &[Uuid]) -> Result<Vec<Branch>, BranchError> {
        let found = try_join_all(ids.iter().map(|id| self.store.find_branch(*id))).await?;

        Ok(ids
            .iter()
            .zip(found)
            .filter_map(|(id, branch)| {
                if branch.is_none() {
                    warn!("Skipping dangling branch id {}", id);
                }
                branch
            })
            .collect())
    }

    async fn resolve_sharing_infos(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<BranchSharingInfo>, BranchError> {
        let found = try_join_all(ids.iter().map(|id| self.store.find_sharing_info(*id))).await?;

        Ok(ids
            .iter()
            .zip(found)
            .filter_map(|(id, info)| {
                if info.is_none() {
                    warn!("Skipping dangling sharing info id {}", id);
                }
                info
            })
            .collect())
    }

    async fn attach_latest_notes(
        &self,
        branches: Vec<Branch>,
    ) -> Result<Vec<PopulatedBranch>, BranchError> {
        try_join_all(branches.into_iter().map(|branch| async move {
            let note = match branch.latest_note {
                Some(note_id) => {
                    let note = self.store.find_note(note_id).await?;
                    if note.is_none() {
                        warn!("Branch {} points at dangling note id {}", branch.id, note_id);
                    }
                    note
                }
                None => None,
            };
            Ok::<_, BranchError>(branch.populate(note))
        }))
        .await
    }

    async fn attach_author_emails(
        &self,
        branches: Vec<PopulatedBranch>,
    ) -> Result<Vec<BranchEntry>, BranchError> {
        try_join_all(branches.into_iter().map(|branch| async move {
            let email = match &branch.latest_note {
                Some(note) => {
                    let author = self
                        .store
                        .find_user(note.created_by)
                        .await?
                        .ok_or(BranchError::NoteAuthorNotFound(note.created_by))?;
                    Some(author.email)
                }
                None => None,
            };
            Ok::<_, BranchError>(BranchEntry { email, branch })
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::models::Note;
    use chrono::{Duration, Utc};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: BranchService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let service = BranchService::new(store.clone());
            Self { store, service }
        }

        async fn user(&self, email: &str) -> User {
            self.store.insert_user(User::new(email)).await
        }

        /// Branch owned by `owner` whose latest note was written by `author`
        /// `minutes_ago` minutes ago
        async fn branch_with_note(&self, owner: &User, author: &User, minutes_ago: i64) -> Branch {
            let (branch, _) = self.service.create_branch(owner.id).await.unwrap();
            let note = self
                .store
                .insert_note(Note::new(author.id, Utc::now() - Duration::minutes(minutes_ago)))
                .await;
            self.store.set_latest_note(branch.id, note.id).await.unwrap();
            branch
        }
    }

    fn page(limit: usize, skip: usize) -> PageRequest {
        PageRequest { limit, skip }
    }

    fn ids(entries: &[BranchEntry]) -> Vec<Uuid> {
        entries.iter().map(|entry| entry.branch.id).collect()
    }

    fn entries(page: BranchPage) -> Vec<BranchEntry> {
        match page {
            BranchPage::Entries(entries) => entries,
            BranchPage::Exhausted => panic!("expected entries, got exhausted page"),
        }
    }

    #[tokio::test]
    async fn create_branch_appends_new_id_last() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        fx.service.create_branch(owner.id).await.unwrap();

        let (branch, updated) = fx.service.create_branch(owner.id).await.unwrap();

        assert_eq!(updated.my_branches.last(), Some(&branch.id));
        assert_eq!(updated.my_branches.len(), 2);
    }

    #[tokio::test]
    async fn create_branch_for_unknown_user_fails() {
        let fx = Fixture::new();
        let missing = Uuid::new_v4();

        let err = fx.service.create_branch(missing).await.unwrap_err();

        assert!(matches!(err, BranchError::UserNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn list_branches_sorts_by_latest_note_descending() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let older = fx.branch_with_note(&owner, &owner, 30).await;
        let newest = fx.branch_with_note(&owner, &owner, 1).await;
        let middle = fx.branch_with_note(&owner, &owner, 10).await;

        let result = entries(fx.service.list_branches(owner.id, page(10, 0)).await.unwrap());

        assert_eq!(ids(&result), vec![newest.id, middle.id, older.id]);
        assert!(result.iter().all(|e| e.email.as_deref() == Some("owner@example.com")));
    }

    #[tokio::test]
    async fn limit_one_returns_only_the_newest() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        fx.branch_with_note(&owner, &owner, 20).await;
        let newer = fx.branch_with_note(&owner, &owner, 5).await;

        let result = entries(fx.service.list_branches(owner.id, page(1, 0)).await.unwrap());

        assert_eq!(ids(&result), vec![newer.id]);
    }

    #[tokio::test]
    async fn pagination_is_a_half_open_window() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let mut expected = Vec::new();
        for minutes_ago in 1..=5 {
            expected.push(fx.branch_with_note(&owner, &owner, minutes_ago).await.id);
        }

        let result = entries(fx.service.list_branches(owner.id, page(2, 2)).await.unwrap());

        assert_eq!(ids(&result), expected[2..4].to_vec());
    }

    #[tokio::test]
    async fn skip_past_the_end_is_exhausted() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        fx.branch_with_note(&owner, &owner, 1).await;
        fx.branch_with_note(&owner, &owner, 2).await;

        let result = fx.service.list_branches(owner.id, page(10, 2)).await.unwrap();
        assert_eq!(result, BranchPage::Exhausted);

        let fresh = fx.user("fresh@example.com").await;
        let result = fx.service.list_branches(fresh.id, page(10, 0)).await.unwrap();
        assert_eq!(result, BranchPage::Exhausted);
    }

    #[tokio::test]
    async fn shared_branches_are_listed_with_their_author_email() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let friend = fx.user("friend@example.com").await;
        let own = fx.branch_with_note(&friend, &friend, 10).await;
        let shared = fx.branch_with_note(&owner, &owner, 1).await;
        fx.service.share_branch(shared.id, "friend@example.com", Some("read")).await.unwrap();

        let result = entries(fx.service.list_branches(friend.id, page(10, 0)).await.unwrap());

        assert_eq!(ids(&result), vec![shared.id, own.id]);
        assert_eq!(result[0].email.as_deref(), Some("owner@example.com"));
        assert_eq!(result[1].email.as_deref(), Some("friend@example.com"));
    }

    #[tokio::test]
    async fn equal_timestamps_keep_both_branches() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let at = Utc::now();
        let mut created = Vec::new();
        for _ in 0..2 {
            let (branch, _) = fx.service.create_branch(owner.id).await.unwrap();
            let note = fx.store.insert_note(Note::new(owner.id, at)).await;
            fx.store.set_latest_note(branch.id, note.id).await.unwrap();
            created.push(branch.id);
        }

        let listing = fx.service.list_branches(owner.id, page(10, 0)).await.unwrap();
        let mut listed = ids(&entries(listing));
        listed.sort();
        created.sort();

        assert_eq!(listed, created);
    }

    #[tokio::test]
    async fn branches_without_notes_sort_last_with_no_email() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let (empty, _) = fx.service.create_branch(owner.id).await.unwrap();
        let noted = fx.branch_with_note(&owner, &owner, 60).await;

        let result = entries(fx.service.list_branches(owner.id, page(10, 0)).await.unwrap());

        assert_eq!(ids(&result), vec![noted.id, empty.id]);
        assert_eq!(result[1].email, None);
        assert!(result[1].branch.latest_note.is_none());
    }

    #[tokio::test]
    async fn private_listing_excludes_shared_branches() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        fx.user("friend@example.com").await;
        let private = fx.branch_with_note(&owner, &owner, 5).await;
        let shared = fx.branch_with_note(&owner, &owner, 1).await;
        fx.service.share_branch(shared.id, "friend@example.com", None).await.unwrap();

        let result = fx.service.list_private_branches(owner.id, page(10, 0)).await.unwrap();

        assert_eq!(ids(&result), vec![private.id]);
        assert!(result.iter().all(|e| e.branch.shared_users_info.is_empty()));
    }

    #[tokio::test]
    async fn private_listing_past_the_end_is_empty() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        fx.branch_with_note(&owner, &owner, 5).await;

        let result = fx.service.list_private_branches(owner.id, page(10, 3)).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn sharing_with_the_author_is_rejected() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let (branch, _) = fx.service.create_branch(owner.id).await.unwrap();

        let err = fx
            .service
            .share_branch(branch.id, "owner@example.com", Some("write"))
            .await
            .unwrap_err();

        assert!(matches!(err, BranchError::SelfShare));
        assert!(fx.store.sharing_infos().await.is_empty());
    }

    #[tokio::test]
    async fn sharing_twice_is_rejected() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        fx.user("friend@example.com").await;
        let (branch, _) = fx.service.create_branch(owner.id).await.unwrap();
        fx.service.share_branch(branch.id, "friend@example.com", Some("write")).await.unwrap();

        let err = fx
            .service
            .share_branch(branch.id, "friend@example.com", Some("read"))
            .await
            .unwrap_err();

        assert!(matches!(err, BranchError::AlreadyShared));
        assert_eq!(fx.store.sharing_infos().await.len(), 1);
    }

    #[tokio::test]
    async fn successful_share_links_grant_on_both_sides() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let friend = fx.user("friend@example.com").await;
        let (branch, _) = fx.service.create_branch(owner.id).await.unwrap();

        let info = fx
            .service
            .share_branch(branch.id, "friend@example.com", Some("write"))
            .await
            .unwrap();

        assert!(info.has_permission);
        let branch = fx.store.find_branch(branch.id).await.unwrap().unwrap();
        let friend = fx.store.find_user(friend.id).await.unwrap().unwrap();
        let owner = fx.store.find_user(owner.id).await.unwrap().unwrap();
        assert_eq!(branch.shared_users_info, vec![info.id]);
        assert_eq!(friend.shared_branches_info, vec![info.id]);
        assert!(owner.shared_branches_info.is_empty());
    }

    #[tokio::test]
    async fn sharing_with_unknown_email_fails() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let (branch, _) = fx.service.create_branch(owner.id).await.unwrap();

        let err = fx
            .service
            .share_branch(branch.id, "nobody@example.com", Some("write"))
            .await
            .unwrap_err();

        assert!(matches!(err, BranchError::RecipientNotFound(_)));
    }

    #[tokio::test]
    async fn dangling_branch_and_grant_ids_are_skipped() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let kept = fx.branch_with_note(&owner, &owner, 1).await;

        let mut stale = fx.store.find_user(owner.id).await.unwrap().unwrap();
        stale.my_branches.push(Uuid::new_v4());
        stale.shared_branches_info.push(Uuid::new_v4());
        fx.store.insert_user(stale).await;

        let listed = entries(fx.service.list_branches(owner.id, page(10, 0)).await.unwrap());
        assert_eq!(ids(&listed), vec![kept.id]);

        let private = fx.service.list_private_branches(owner.id, page(10, 0)).await.unwrap();
        assert_eq!(ids(&private), vec![kept.id]);
    }

    #[tokio::test]
    async fn only_dangling_ids_means_no_more_branches() {
        let fx = Fixture::new();
        let mut ghost = User::new("ghost@example.com");
        ghost.my_branches.push(Uuid::new_v4());
        ghost.shared_branches_info.push(Uuid::new_v4());
        let ghost = fx.store.insert_user(ghost).await;

        let result = fx.service.list_branches(ghost.id, page(10, 0)).await.unwrap();

        assert_eq!(result, BranchPage::Exhausted);
    }

    #[tokio::test]
    async fn dangling_latest_note_lists_without_note() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let (branch, _) = fx.service.create_branch(owner.id).await.unwrap();
        fx.store.set_latest_note(branch.id, Uuid::new_v4()).await.unwrap();

        let listed = entries(fx.service.list_branches(owner.id, page(10, 0)).await.unwrap());

        assert_eq!(ids(&listed), vec![branch.id]);
        assert!(listed[0].branch.latest_note.is_none());
        assert_eq!(listed[0].email, None);
    }

    #[tokio::test]
    async fn missing_note_author_is_not_found() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let departed = User::new("departed@example.com");
        let branch = fx.branch_with_note(&owner, &departed, 1).await;

        let err = fx.service.list_branches(owner.id, page(10, 0)).await.unwrap_err();

        assert!(matches!(err, BranchError::NoteAuthorNotFound(id) if id == departed.id));
        let api_err = crate::error::ApiError::from(err);
        assert_eq!(api_err.status_code(), axum::http::StatusCode::NOT_FOUND);
        assert_eq!(api_err.to_json()["result"], "error");

        // The same branch still shows up once the author exists again
        fx.store.insert_user(departed).await;
        let listed = entries(fx.service.list_branches(owner.id, page(10, 0)).await.unwrap());
        assert_eq!(ids(&listed), vec![branch.id]);
    }

    #[test]
    fn only_write_grants_write() {
        assert!(grants_write(Some("write")));
        assert!(!grants_write(Some("read")));
        assert!(!grants_write(Some("WRITE")));
        assert!(!grants_write(None));
    }

    #[test]
    fn paginate_handles_short_tails() {
        assert_eq!(paginate(vec![1, 2, 3], page(5, 1)), vec![2, 3]);
        assert_eq!(paginate(vec![1, 2, 3], page(0, 0)), Vec::<i32>::new());
        assert_eq!(paginate(vec![1, 2, 3], page(2, 7)), Vec::<i32>::new());
    }
}
