use thiserror::Error;

use uuid::Uuid;

use crate::client::{CommerceClient, CommerceError};
use crate::model::{
    ContestEntry, Customer, CustomerEmail, CustomerPayload, CustomerPhone, EmailMarketingStatus,
    Metadata, TagRef,
};

/// Country applied to every record this service writes
const COUNTRY_CODE: &str = "US";

/// Metadata keys that survive the upsert. Per-entry keys (entry date, prize)
/// are dropped so repeated entries do not accumulate on the record.
const METADATA_KEEP: &[&str] = &["source"];

/// What to do when the customer search fails outright
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchFailurePolicy {
    /// Treat the failure as "no record found" and fall through to creation.
    /// A transient search outage then costs at worst a duplicate record
    /// instead of a lost entry.
    #[default]
    AssumeNotFound,
    /// Surface the failure to the caller
    Propagate,
}

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("Contest tag id is not configured")]
    TagNotConfigured,

    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

/// Create-or-update of a contest entrant on the commerce platform.
///
/// The lookup and the write are two separate calls with no transactional
/// guarantee from the platform, so near-simultaneous entries for the same
/// email can both observe "not found" and create duplicate records. The
/// platform offers no conditional-write primitive to close that window.
#[derive(Debug)]
pub struct CustomerUpsert<'a> {
    client: &'a CommerceClient,
    search_failure: SearchFailurePolicy,
}

impl<'a> CustomerUpsert<'a> {
    pub fn new(client: &'a CommerceClient) -> Self {
        Self {
            client,
            search_failure: SearchFailurePolicy::default(),
        }
    }

    pub fn with_search_failure_policy(mut self, policy: SearchFailurePolicy) -> Self {
        self.search_failure = policy;
        self
    }

    /// Upsert the entrant, returning the resulting customer record in both
    /// the create and update branches
    #[tracing::instrument(name = "Upsert a contest entrant", skip(self, metadata))]
    pub async fn run(
        &self,
        entry: &ContestEntry,
        metadata: &Metadata,
    ) -> Result<Customer, UpsertError> {
        let tag_id = self
            .client
            .contest_tag_id()
            .ok_or(UpsertError::TagNotConfigured)?;

        let existing = match self.client.search_by_email(&entry.email).await {
            Ok(existing) => existing,
            Err(error) => match self.search_failure {
                SearchFailurePolicy::AssumeNotFound => {
                    tracing::warn!(
                        error.cause_chain = ?error,
                        "Customer search failed, falling through to record creation"
                    );
                    None
                }
                SearchFailurePolicy::Propagate => return Err(error.into()),
            },
        };

        let customer = match existing {
            Some(customer) => {
                let payload = update_payload(&customer, entry, tag_id, metadata);
                self.client.update(customer.id, &payload).await?
            }
            None => {
                let payload = create_payload(entry, tag_id, metadata);
                self.client.create(&payload).await?
            }
        };

        Ok(customer)
    }
}

/// Update body for an existing record: existing tags unioned with the contest
/// tag, metadata re-filtered, subscription re-asserted. A submitted phone
/// replaces the stored phone list outright.
fn update_payload(
    existing: &Customer,
    entry: &ContestEntry,
    tag_id: Uuid,
    metadata: &Metadata,
) -> CustomerPayload {
    let existing_tags = existing.tags.as_deref().unwrap_or_default();
    let existing_metadata = existing.meta_data.as_ref();

    CustomerPayload {
        first_name: entry.first_name.as_ref().to_string(),
        last_name: entry.last_name.as_ref().to_string(),
        emails: None,
        phones: submitted_phones(entry),
        email_marketing_status: EmailMarketingStatus::Subscribed,
        tags: merge_tags(existing_tags, tag_id),
        country_code: COUNTRY_CODE,
        meta_data: retained_metadata(existing_metadata, metadata),
    }
}

/// Create body for a brand-new record
fn create_payload(entry: &ContestEntry, tag_id: Uuid, metadata: &Metadata) -> CustomerPayload {
    CustomerPayload {
        first_name: entry.first_name.as_ref().to_string(),
        last_name: entry.last_name.as_ref().to_string(),
        emails: Some(vec![CustomerEmail {
            email: entry.email.as_ref().to_string(),
        }]),
        phones: submitted_phones(entry),
        email_marketing_status: EmailMarketingStatus::Subscribed,
        tags: vec![TagRef { id: tag_id }],
        country_code: COUNTRY_CODE,
        meta_data: retained_metadata(None, metadata),
    }
}

fn submitted_phones(entry: &ContestEntry) -> Option<Vec<CustomerPhone>> {
    entry.phone.as_ref().map(|phone| {
        vec![CustomerPhone {
            phone: phone.as_ref().to_string(),
        }]
    })
}

/// Union of the existing tag set and the contest tag, by id
fn merge_tags(existing: &[TagRef], tag_id: Uuid) -> Vec<TagRef> {
    let mut tags: Vec<TagRef> = existing.to_vec();
    if !tags.iter().any(|tag| tag.id == tag_id) {
        tags.push(TagRef { id: tag_id });
    }
    tags
}

/// Overlay submitted metadata on the existing mapping, then keep only the
/// allow-listed keys. Omitted entirely when nothing survives.
fn retained_metadata(existing: Option<&Metadata>, submitted: &Metadata) -> Option<Metadata> {
    let mut merged = existing.cloned().unwrap_or_default();
    merged.extend(submitted.clone());
    merged.retain(|key, _| METADATA_KEEP.contains(&key.as_str()));

    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}
