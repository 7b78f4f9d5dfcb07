use reqwest::{header, Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;
use tracing::{debug, warn};

use crate::config::MarketingCredentials;

const AUTH_SCHEME: &str = "Klaviyo-API-Key";
const REVISION_HEADER: &str = "revision";
const PROFILE_TYPE: &str = "profile";
const COUNTRY: &str = "Australia";

/// Opaque contact identifier assigned by the marketing platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for ProfileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The contact fields written on both create and update.
#[derive(Debug)]
pub struct ContactProfile<'a> {
    pub first_name: &'a str,
    pub phone_number: &'a str,
    pub postcode: &'a str,
    pub source: &'a str,
    /// RFC 3339 UTC timestamp.
    pub signup_date: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(ProfileId),
    /// A contact with the same phone number already exists.
    Conflict(Option<ProfileId>),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ListAttach {
    Attached,
    Rejected(StatusCode),
}

#[derive(Debug)]
pub struct MarketingClient {
    pub http_client: Client,
    pub url: reqwest::Url,
    pub list_id: String,
    revision: String,
    api_key: SecretString,
}

impl MarketingClient {
    pub fn new<S: AsRef<str>>(
        url: S,
        credentials: MarketingCredentials,
        revision: String,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let mut url =
            reqwest::Url::parse(url.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;
        // `Url::join` replaces the last segment unless the base path ends with '/'.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(MarketingClient {
            http_client,
            url,
            list_id: credentials.list_id,
            revision,
            api_key: credentials.api_key,
        })
    }

    /// Creates the contact or, when the platform reports a duplicate, updates the existing one.
    #[tracing::instrument(name = "Upserting contact profile", skip_all)]
    pub async fn upsert_profile(&self, profile: &ContactProfile<'_>) -> Result<ProfileId> {
        match self.create_profile(profile).await? {
            CreateOutcome::Created(id) => {
                debug!("{:<12} - created profile {}", "UPSERT", id.as_ref());
                Ok(id)
            }
            CreateOutcome::Conflict(Some(id)) => {
                debug!("{:<12} - updating duplicate profile {}", "UPSERT", id.as_ref());
                self.update_profile(&id, profile).await?;
                Ok(id)
            }
            CreateOutcome::Conflict(None) => Err(Error::MissingDuplicateId),
        }
    }

    pub async fn create_profile(&self, profile: &ContactProfile<'_>) -> Result<CreateOutcome> {
        let url = self.endpoint("api/profiles/")?;
        let body = Document {
            data: ProfileResource {
                kind: PROFILE_TYPE,
                id: None,
                attributes: ProfileAttributes::from(profile),
            },
        };

        let resp = self.request(self.http_client.post(url)).json(&body).send().await?;

        match resp.status() {
            status if status.is_success() => {
                let created: Document<CreatedProfile> = resp.json().await?;
                Ok(CreateOutcome::Created(created.data.id))
            }
            StatusCode::CONFLICT => Ok(CreateOutcome::Conflict(duplicate_profile_id(resp).await)),
            status => Err(Error::ProfileCreateFailed {
                status,
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    /// A non-success response is logged and tolerated: the contact already exists.
    pub async fn update_profile(&self, id: &ProfileId, profile: &ContactProfile<'_>) -> Result<()> {
        let url = self.endpoint(&format!("api/profiles/{}/", id.as_ref()))?;
        let body = Document {
            data: ProfileResource {
                kind: PROFILE_TYPE,
                id: Some(id.as_ref()),
                attributes: ProfileAttributes::from(profile),
            },
        };

        let resp = self.request(self.http_client.patch(url)).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                "{:<12} - updating profile {} returned {status}: {body}",
                "UPDATE",
                id.as_ref()
            );
        }

        Ok(())
    }

    /// Adds the contact to the configured list. Adding an existing member is a no-op on the platform.
    pub async fn add_to_list(&self, id: &ProfileId) -> Result<ListAttach> {
        let url = self.endpoint(&format!(
            "api/lists/{}/relationships/profiles/",
            self.list_id
        ))?;
        let body = Document {
            data: [ResourceIdentifier {
                kind: PROFILE_TYPE,
                id: id.as_ref(),
            }],
        };

        let resp = self.request(self.http_client.post(url)).json(&body).send().await?;

        let status = resp.status();
        if status.is_success() {
            Ok(ListAttach::Attached)
        } else {
            Ok(ListAttach::Rejected(status))
        }
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url> {
        self.url
            .join(path)
            .map_err(|e| Error::UrlParsing(e.to_string()))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(
                header::AUTHORIZATION,
                format!("{AUTH_SCHEME} {}", self.api_key.expose_secret()),
            )
            .header(REVISION_HEADER, &self.revision)
            .header(header::ACCEPT, "application/json")
    }
}

/// Pulls `errors[*].meta.duplicate_profile_id` out of a conflict response.
async fn duplicate_profile_id(resp: Response) -> Option<ProfileId> {
    let errors: ErrorDocument = resp.json().await.ok()?;
    errors
        .errors
        .into_iter()
        .find_map(|er| er.meta.and_then(|meta| meta.duplicate_profile_id))
}

// ###################################
// ->   PAYLOADS
// ###################################
#[derive(Serialize, Deserialize)]
struct Document<T> {
    data: T,
}

#[derive(Serialize)]
struct ProfileResource<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    attributes: ProfileAttributes<'a>,
}

#[derive(Serialize)]
struct ResourceIdentifier<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    id: &'a str,
}

#[derive(Serialize)]
struct ProfileAttributes<'a> {
    phone_number: &'a str,
    first_name: &'a str,
    location: Location<'a>,
    properties: ProfileProperties<'a>,
}

#[derive(Serialize)]
struct Location<'a> {
    zip: &'a str,
    country: &'a str,
}

#[derive(Serialize)]
struct ProfileProperties<'a> {
    postcode: &'a str,
    source: &'a str,
    signup_date: &'a str,
}

impl<'a> From<&'a ContactProfile<'a>> for ProfileAttributes<'a> {
    fn from(profile: &'a ContactProfile<'a>) -> Self {
        ProfileAttributes {
            phone_number: profile.phone_number,
            first_name: profile.first_name,
            location: Location {
                zip: profile.postcode,
                country: COUNTRY,
            },
            properties: ProfileProperties {
                postcode: profile.postcode,
                source: profile.source,
                signup_date: &profile.signup_date,
            },
        }
    }
}

#[derive(Deserialize)]
struct CreatedProfile {
    id: ProfileId,
}

#[derive(Deserialize)]
struct ErrorDocument {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    meta: Option<ErrorMeta>,
}

#[derive(Deserialize)]
struct ErrorMeta {
    duplicate_profile_id: Option<ProfileId>,
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[strum(serialize = "missing_duplicate_id")]
    #[error("conflict response did not carry a duplicate profile id")]
    MissingDuplicateId,
    #[strum(serialize = "profile_create_failed")]
    #[error("profile creation failed with {status}: {body}")]
    ProfileCreateFailed { status: StatusCode, body: String },

    #[strum(serialize = "url_parsing")]
    #[error("url parsing error: {0}")]
    UrlParsing(String),
    #[strum(serialize = "http_client")]
    #[error("http request to the marketing platform failed")]
    Reqwest(#[from] reqwest::Error),
}
