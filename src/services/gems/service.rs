//! Gems service implementation.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::GemsService;
use crate::error::{GeminiWebResult, ResourceError, ResponseError};
use crate::protocol::constants::{gems, paths, rpc};
use crate::protocol::{get_array, get_non_empty_str, get_str};
use crate::services::batch::BatchExecutor;
use crate::streaming::extract_json_from_response;
use crate::types::{Gem, GemJar, RpcCall};

/// Implementation of the gems service.
pub struct GemsServiceImpl {
    batch: BatchExecutor,
    cache: RwLock<Option<GemJar>>,
}

/// Gem body shared by create and update: name, description, prompt, then
/// fixed flags.
fn gem_fields(name: &str, prompt: &str, description: &str) -> Vec<Value> {
    vec![
        json!(name),
        json!(description),
        json!(prompt),
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        json!(0),
        Value::Null,
        json!(1),
        Value::Null,
        Value::Null,
        Value::Null,
        json!([]),
    ]
}

fn custom_gem(id: String, name: &str, prompt: &str, description: &str) -> Gem {
    Gem {
        id,
        name: name.to_string(),
        description: (!description.is_empty()).then(|| description.to_string()),
        prompt: (!prompt.is_empty()).then(|| prompt.to_string()),
        predefined: false,
    }
}

fn unexpected(message: &str) -> ResponseError {
    ResponseError::UnexpectedFormat {
        message: message.to_string(),
    }
}

impl GemsServiceImpl {
    pub(crate) fn new(batch: BatchExecutor) -> Self {
        Self {
            batch,
            cache: RwLock::new(None),
        }
    }

    fn update_cache(&self, f: impl FnOnce(&mut GemJar)) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(jar) = cache.as_mut() {
            f(jar);
        }
    }

    /// Reads both listings out of a batch response.
    fn parse_listing(text: &str) -> GeminiWebResult<GemJar> {
        let parts = extract_json_from_response(text)?;

        let mut predefined = Vec::new();
        let mut custom = Vec::new();
        for part in &parts {
            let Some(body) = get_non_empty_str(part, paths::PART_BODY) else {
                continue;
            };
            let Ok(body) = serde_json::from_str::<Value>(body) else {
                tracing::debug!("Skipping gem listing with malformed body");
                continue;
            };
            let list = get_array(&body, paths::GEMS_LIST).cloned().unwrap_or_default();
            match get_str(part, paths::PART_IDENTIFIER) {
                Some(gems::IDENTIFIER_SYSTEM) => predefined = list,
                Some(gems::IDENTIFIER_CUSTOM) => custom = list,
                _ => {}
            }
        }

        if predefined.is_empty() && custom.is_empty() {
            return Err(unexpected("no gems in listing response").into());
        }

        Ok(GemJar::new(
            predefined
                .iter()
                .filter_map(|g| Gem::from_listing(g, true))
                .chain(custom.iter().filter_map(|g| Gem::from_listing(g, false))),
        ))
    }
}

#[async_trait]
impl GemsService for GemsServiceImpl {
    async fn fetch_gems(&self, include_hidden: bool, language: &str) -> GeminiWebResult<GemJar> {
        let system_kind = if include_hidden {
            gems::KIND_SYSTEM_HIDDEN
        } else {
            gems::KIND_SYSTEM
        };
        let calls = [
            RpcCall::new(rpc::LIST_GEMS, format!("[{system_kind},['{language}'],0]"))
                .with_identifier(gems::IDENTIFIER_SYSTEM),
            RpcCall::new(rpc::LIST_GEMS, format!("[{},['{language}'],0]", gems::KIND_CUSTOM))
                .with_identifier(gems::IDENTIFIER_CUSTOM),
        ];

        let response = self.batch.execute(&calls).await?;
        let jar = Self::parse_listing(&response.text())?;
        tracing::debug!(count = jar.len(), "Fetched gems");

        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(jar.clone());
        Ok(jar)
    }

    fn gems(&self) -> GeminiWebResult<GemJar> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ResourceError::GemsNotFetched.into())
    }

    fn get_gem(&self, id: Option<&str>, name: Option<&str>) -> GeminiWebResult<Gem> {
        let jar = self.gems()?;
        jar.get(id, name).cloned().ok_or_else(|| {
            ResourceError::GemNotFound {
                key: id.or(name).unwrap_or_default().to_string(),
            }
            .into()
        })
    }

    async fn create_gem(&self, name: &str, prompt: &str, description: &str) -> GeminiWebResult<Gem> {
        let payload = serde_json::to_string(&json!([gem_fields(name, prompt, description)]))?;
        let response = self
            .batch
            .execute(&[RpcCall::new(rpc::CREATE_GEM, payload)])
            .await?;

        let parts = extract_json_from_response(&response.text())?;
        let body = parts
            .first()
            .and_then(|part| get_non_empty_str(part, paths::PART_BODY))
            .ok_or_else(|| unexpected("gem creation response has no body"))?;
        let body: Value = serde_json::from_str(body)?;
        let id = get_non_empty_str(&body, paths::CREATED_GEM_ID)
            .ok_or_else(|| unexpected("gem creation response has no id"))?;

        let gem = custom_gem(id.to_string(), name, prompt, description);
        tracing::debug!(gem_id = %gem.id, "Created gem");
        self.update_cache(|jar| jar.insert(gem.clone()));
        Ok(gem)
    }

    async fn update_gem(
        &self,
        gem_id: &str,
        name: &str,
        prompt: &str,
        description: &str,
    ) -> GeminiWebResult<Gem> {
        let mut fields = gem_fields(name, prompt, description);
        fields.push(json!(0));
        let payload = serde_json::to_string(&json!([gem_id, fields]))?;
        self.batch
            .execute(&[RpcCall::new(rpc::UPDATE_GEM, payload)])
            .await?;

        let gem = custom_gem(gem_id.to_string(), name, prompt, description);
        self.update_cache(|jar| jar.insert(gem.clone()));
        Ok(gem)
    }

    async fn delete_gem(&self, gem_id: &str) -> GeminiWebResult<()> {
        let payload = serde_json::to_string(&json!([gem_id]))?;
        self.batch
            .execute(&[RpcCall::new(rpc::DELETE_GEM, payload)])
            .await?;

        self.update_cache(|jar| {
            jar.remove(gem_id);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::auth::{extract_tokens, SessionManager};
    use crate::config::GeminiWebConfig;
    use crate::error::GeminiWebError;
    use crate::mocks::MockHttpTransport;
    use crate::transport::RequestBuilder;
    use secrecy::SecretString;

    fn service(transport: Arc<MockHttpTransport>) -> GemsServiceImpl {
        let config = GeminiWebConfig::builder()
            .secure_1psid(SecretString::new("psid".into()))
            .build()
            .unwrap();
        let session = Arc::new(SessionManager::new(&config));
        session.install_tokens(extract_tokens(r#""SNlM0e":"at""#).unwrap());
        let requests = RequestBuilder::new(config.endpoints, Arc::clone(&session));
        GemsServiceImpl::new(BatchExecutor::new(transport, requests, session))
    }

    fn part(identifier: &str, body: Value) -> Value {
        json!(["wrb.fr", "CNgdBe", body.to_string(), null, null, null, identifier])
    }

    fn listing() -> String {
        let system = json!([null, null, [
            ["coding", ["Coding partner", "Helps with code"], ["You are a coding partner."]],
            ["brainstormer", ["Brainstormer", ""], [""]]
        ]]);
        let custom = json!([null, null, [
            ["c-1", ["Poet", "Writes verse"], ["Answer in rhyme."]]
        ]]);
        format!(
            ")]}}'\n{}\n{}\n",
            json!([part("system", system)]),
            json!([part("custom", custom)])
        )
    }

    fn body_of(transport: &MockHttpTransport) -> String {
        let body = transport.last_request().unwrap().body.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        url::form_urlencoded::parse(body.as_bytes())
            .find(|(k, _)| k == "f.req")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_gems() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_text_response(200, &listing());
        let gems = service(Arc::clone(&transport));

        let jar = gems.fetch_gems(false, "en").await.unwrap();

        assert_eq!(jar.len(), 3);
        assert_eq!(jar.filter(Some(true), None).len(), 2);
        let poet = jar.get(Some("c-1"), None).unwrap();
        assert!(!poet.predefined);
        assert_eq!(poet.prompt.as_deref(), Some("Answer in rhyme."));
        let brainstormer = jar.get(None, Some("Brainstormer")).unwrap();
        assert_eq!(brainstormer.description, None);

        transport.verify_request(0, crate::transport::HttpMethod::Post, "rpcids=CNgdBe%2CCNgdBe");
        let f_req = body_of(&transport);
        assert!(f_req.contains(r#""[3,['en'],0]""#));
        assert!(f_req.contains(r#""[2,['en'],0]""#));

        assert_eq!(gems.gems().unwrap(), jar);
    }

    #[tokio::test]
    async fn test_fetch_hidden_gems_payload() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_text_response(200, &listing());
        let gems = service(Arc::clone(&transport));

        gems.fetch_gems(true, "fr").await.unwrap();

        assert!(body_of(&transport).contains(r#""[4,['fr'],0]""#));
    }

    #[tokio::test]
    async fn test_empty_listing_is_unexpected() {
        let transport = Arc::new(MockHttpTransport::new());
        let empty = format!(
            ")]}}'\n{}\n",
            json!([part("system", json!([null, null, []])), part("custom", json!([null, null, null]))])
        );
        transport.enqueue_text_response(200, &empty);
        let gems = service(Arc::clone(&transport));

        let err = gems.fetch_gems(false, "en").await.unwrap_err();

        assert!(matches!(
            err,
            GeminiWebError::Response(ResponseError::UnexpectedFormat { .. })
        ));
        assert!(matches!(
            gems.gems().unwrap_err(),
            GeminiWebError::Resource(ResourceError::GemsNotFetched)
        ));
    }

    #[tokio::test]
    async fn test_get_gem_requires_fetch() {
        let gems = service(Arc::new(MockHttpTransport::new()));

        let err = gems.get_gem(Some("coding"), None).unwrap_err();

        assert!(matches!(err, GeminiWebError::Resource(ResourceError::GemsNotFetched)));
    }

    #[tokio::test]
    async fn test_get_gem_not_found() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_text_response(200, &listing());
        let gems = service(Arc::clone(&transport));
        gems.fetch_gems(false, "en").await.unwrap();

        let err = gems.get_gem(Some("missing"), None).unwrap_err();

        assert!(matches!(
            err,
            GeminiWebError::Resource(ResourceError::GemNotFound { ref key }) if key == "missing"
        ));
    }

    #[tokio::test]
    async fn test_create_update_delete_keep_cache_in_step() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_text_response(200, &listing());
        let created = format!(
            ")]}}'\n{}\n",
            json!([["wrb.fr", "oMH3Zd", json!(["c-2"]).to_string(), null, null, null, "generic"]])
        );
        transport.enqueue_text_response(200, &created);
        transport.enqueue_text_response(200, ")]}'\n");
        transport.enqueue_text_response(200, ")]}'\n");
        let gems = service(Arc::clone(&transport));
        gems.fetch_gems(false, "en").await.unwrap();

        let gem = gems.create_gem("Chef", "Talk about food.", "").await.unwrap();
        assert_eq!(gem.id, "c-2");
        assert_eq!(gem.description, None);
        assert!(!gem.predefined);
        let f_req = body_of(&transport);
        assert!(f_req.contains("oMH3Zd"));
        assert!(f_req.contains(r#"[[\"Chef\",\"\",\"Talk about food.\",null,null,null,null,null,0,null,1,null,null,null,[]]]"#));
        assert_eq!(gems.get_gem(Some("c-2"), None).unwrap(), gem);

        let updated = gems
            .update_gem("c-2", "Chef", "Only desserts.", "Sweet")
            .await
            .unwrap();
        let f_req = body_of(&transport);
        assert!(f_req.contains("kHv0Vd"));
        assert!(f_req.contains(r#"[\"c-2\",[\"Chef\",\"Sweet\",\"Only desserts.\",null,null,null,null,null,0,null,1,null,null,null,[],0]]"#));
        assert_eq!(gems.get_gem(Some("c-2"), None).unwrap(), updated);

        gems.delete_gem("c-2").await.unwrap();
        assert!(body_of(&transport).contains(r#"[\"c-2\"]"#));
        assert!(gems.get_gem(Some("c-2"), None).is_err());
        assert_eq!(gems.gems().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_without_id_is_unexpected() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_text_response(200, ")]}'\n[[\"wrb.fr\",\"oMH3Zd\",null]]\n");
        let gems = service(Arc::clone(&transport));

        let err = gems.create_gem("Chef", "p", "d").await.unwrap_err();

        assert!(matches!(
            err,
            GeminiWebError::Response(ResponseError::UnexpectedFormat { .. })
        ));
    }
}
