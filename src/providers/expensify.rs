//! Expensify Integration Server: form-encoded job descriptions with the
//! partner credentials embedded in every body
//!
//! Failures come back as HTTP 200 with a `responseCode` other than 200.

use crate::auth::AuthConfig;
use crate::connector::{
    AuthScheme, MetadataSource, ProviderBinding, ProviderInfo, ResolvedParams, ROOT_MODULE,
};
use crate::error::{Error, ErrorKind, Result};
use crate::http::{ErrorHandler, HttpRequest, HttpResponse};
use crate::interpreter::{BodyStatusCheck, ErrorInterpreter};
use crate::jsonquery::JsonQuery;
use crate::pagination::NoPaginator;
use crate::pipeline::{
    parse_page, ReadContext, ReadHandler, ReadPage, RecordLocator, WriteContext, WriteHandler,
    WriteMethod,
};
use crate::registry::{EndpointEntry, Support};
use crate::types::{JsonValue, ModuleId, WriteResult};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(super) const INFO: ProviderInfo = ProviderInfo {
    name: "expensify",
    display_name: "Expensify",
    base_url: "https://integrations.expensify.com/Integration-Server/ExpensifyIntegrations",
    auth: AuthScheme::BodyCredentials,
    token_url: None,
    modules: &[ROOT_MODULE],
    requires_workspace: false,
    required_metadata: &[],
    support: Support::READ.with_write(),
    metadata: MetadataSource::EndpointSample,
};

const JOB_FIELD: &str = "requestJobDescription";
const EMPLOYEE_EMAIL: &str = "employeeEmail";

/// Partner credentials as the job description expects them
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PartnerCredentials {
    #[serde(rename = "partnerUserID")]
    partner_user_id: String,
    partner_user_secret: String,
}

pub(super) fn binding(resolved: &ResolvedParams) -> Result<Box<dyn ProviderBinding>> {
    let AuthConfig::Basic { username, password } = &resolved.auth else {
        return Err(Error::auth("expensify expects partner credentials as basic auth"));
    };
    Ok(Box::new(Expensify {
        handler: Arc::new(JobHandler {
            endpoint: resolved.base_url.clone(),
            credentials: PartnerCredentials {
                partner_user_id: username.clone(),
                partner_user_secret: password.clone(),
            },
        }),
    }))
}

struct Expensify {
    handler: Arc<JobHandler>,
}

impl ProviderBinding for Expensify {
    fn endpoints(&self) -> BTreeMap<ModuleId, Vec<EndpointEntry>> {
        BTreeMap::from([(
            ROOT_MODULE.to_string(),
            vec![
                EndpointEntry::new("policies", Support::READ),
                EndpointEntry::new("expenses", Support::NONE.with_write()),
            ],
        )])
    }

    fn error_handler(&self) -> Arc<dyn ErrorHandler> {
        Arc::new(
            ErrorInterpreter::default().with_body_status(
                BodyStatusCheck::new("responseCode").with_message_field("responseMessage"),
            ),
        )
    }

    fn read_handler(&self) -> Option<Arc<dyn ReadHandler>> {
        Some(Arc::clone(&self.handler) as Arc<dyn ReadHandler>)
    }

    fn write_handler(&self) -> Option<Arc<dyn WriteHandler>> {
        Some(Arc::clone(&self.handler) as Arc<dyn WriteHandler>)
    }
}

struct JobHandler {
    endpoint: String,
    credentials: PartnerCredentials,
}

impl JobHandler {
    fn job(&self, job_type: &str, input_settings: JsonValue) -> Result<HttpRequest> {
        let description = json!({
            "type": job_type,
            "credentials": self.credentials,
            "inputSettings": input_settings,
        });
        let encoded = serde_json::to_string(&description)?;
        Ok(HttpRequest::post(self.endpoint.clone()).form([(JOB_FIELD, encoded)]))
    }
}

impl ReadHandler for JobHandler {
    fn build_request(&self, ctx: &ReadContext<'_>) -> Result<HttpRequest> {
        match ctx.object() {
            "policies" => self.job("get", json!({ "type": "policyList" })),
            other => Err(Error::with_message(
                ErrorKind::ObjectNotSupported,
                other.to_string(),
            )),
        }
    }

    fn parse_response(
        &self,
        ctx: &ReadContext<'_>,
        request_url: &str,
        response: &HttpResponse,
    ) -> Result<ReadPage> {
        parse_page(
            &RecordLocator::key(&["policyList"]),
            &NoPaginator,
            ctx,
            request_url,
            response,
        )
    }
}

impl WriteHandler for JobHandler {
    fn build_request(&self, ctx: &WriteContext<'_>) -> Result<HttpRequest> {
        if let WriteMethod::Update(_) = ctx.method {
            return Err(Error::with_message(
                ErrorKind::OperationNotSupportedForObject,
                format!("{} can only be created", ctx.object),
            ));
        }

        let mut expense = ctx.object_data()?;
        let Some(JsonValue::String(email)) = expense.remove(EMPLOYEE_EMAIL) else {
            return Err(Error::with_message(
                ErrorKind::MissingRecordData,
                format!("{EMPLOYEE_EMAIL} is required"),
            ));
        };

        self.job(
            "create",
            json!({
                "type": ctx.object,
                "employeeEmail": email,
                "transactionList": [expense],
            }),
        )
    }

    fn parse_response(&self, _ctx: &WriteContext<'_>, response: &HttpResponse) -> Result<WriteResult> {
        let body = response.body_required()?;
        let created = JsonQuery::new(body)
            .array_optional("transactionList")?
            .and_then(|list| list.first())
            .and_then(JsonValue::as_object);

        let record_id = created
            .and_then(|t| t.get("transactionID"))
            .and_then(|id| match id {
                JsonValue::String(s) => Some(s.clone()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            });
        Ok(WriteResult::success(record_id, created.cloned()))
    }
}
