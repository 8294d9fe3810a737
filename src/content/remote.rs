use std::time::Duration;

use reqwest::blocking::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use super::{ContentError, ContentSource};

pub const DEFAULT_API_BASE_URL: &str = "https://dactilo-backend.vercel.app";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A timed test offered by the backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PracticeTest {
    pub id: u64,
    #[serde(rename = "institucion_id")]
    pub institution_id: u64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "minutos")]
    pub minutes: u32,
    #[serde(rename = "minimo_palabras")]
    pub minimum_words: usize,
    #[serde(rename = "institucion_nombre", default)]
    pub institution_name: Option<String>,
    #[serde(rename = "provincia", default)]
    pub province: Option<String>,
}

impl PracticeTest {
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.minutes) * 60
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Institution {
    pub id: u64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "provincia", default)]
    pub province: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TestText {
    #[serde(rename = "texto")]
    text: String,
}

#[derive(Debug, Deserialize)]
struct TextsResponse {
    #[serde(rename = "textos", default)]
    texts: Vec<TestText>,
}

#[derive(Debug, Deserialize)]
struct TestsResponse {
    #[serde(rename = "pruebas", default)]
    tests: Vec<PracticeTest>,
}

#[derive(Debug, Deserialize)]
struct InstitutionsResponse {
    #[serde(rename = "instituciones", default)]
    institutions: Vec<Institution>,
}

/// Client for the practice backend's REST API
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: Client,
    base_url: String,
}

impl RemoteSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ContentError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ContentError> {
        let url = self.endpoint(path);
        debug!(%url, ?query, "GET");

        let response = self.client.get(&url).query(query).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status(status.as_u16()));
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    pub fn list_institutions(&self) -> Result<Vec<Institution>, ContentError> {
        let response: InstitutionsResponse = self.get("instituciones", &[])?;
        Ok(response.institutions)
    }

    pub fn list_tests(&self, institution_id: Option<u64>) -> Result<Vec<PracticeTest>, ContentError> {
        let query: Vec<(&str, String)> = institution_id
            .map(|id| vec![("institucion_id", id.to_string())])
            .unwrap_or_default();
        let response: TestsResponse = self.get("pruebas", &query)?;
        Ok(response.tests)
    }

    pub fn find_test(&self, test_id: u64) -> Result<PracticeTest, ContentError> {
        self.list_tests(None)?
            .into_iter()
            .find(|t| t.id == test_id)
            .ok_or(ContentError::NoSuchTest(test_id))
    }
}

impl ContentSource for RemoteSource {
    fn fetch_reference_text(&self, test_id: Option<u64>) -> Result<String, ContentError> {
        let mut query = vec![("random", "true".to_string())];
        if let Some(id) = test_id {
            query.push(("prueba_id", id.to_string()));
        }

        let response: TextsResponse = self.get("textos-prueba", &query)?;
        response
            .texts
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or(ContentError::Empty)
    }
}
