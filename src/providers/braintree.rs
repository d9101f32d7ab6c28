//! Braintree: GraphQL over a single endpoint with Relay cursors
//!
//! Every verb is a POST to `/graphql`. GraphQL reports failures with a 200
//! status and an `errors` array, which the error handler turns into
//! `BadRequest` before any parser sees the body.

use crate::connector::{
    AuthScheme, MetadataSource, ProviderBinding, ProviderInfo, ResolvedParams, ROOT_MODULE,
};
use crate::error::{Error, ErrorKind, Result};
use crate::http::{ErrorHandler, HttpRequest, HttpResponse};
use crate::interpreter::{ErrorInterpreter, ErrorList, FormatSwitch, Template};
use crate::jsonquery::JsonQuery;
use crate::pagination::RelayPaginator;
use crate::pipeline::{
    parse_page, DeleteContext, DeleteHandler, ReadContext, ReadHandler, ReadPage, RecordLocator,
    WriteContext, WriteHandler, WriteMethod,
};
use crate::registry::{EndpointEntry, Support};
use crate::types::{DeleteResult, JsonValue, ModuleId, WriteResult};
use crate::urlbuilder::UrlBuilder;
use reqwest::header::HeaderMap;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(super) const INFO: ProviderInfo = ProviderInfo {
    name: "braintree",
    display_name: "Braintree",
    base_url: "https://payments.braintree-api.com",
    auth: AuthScheme::Basic,
    token_url: None,
    modules: &[ROOT_MODULE],
    requires_workspace: false,
    required_metadata: &[],
    support: Support::ALL,
    metadata: MetadataSource::EndpointSample,
};

const API_VERSION: &str = "2019-01-01";
const DEFAULT_PAGE_SIZE: u32 = 50;

const SEARCH_CUSTOMERS: &str = "query SearchCustomers($first: Int!, $after: String) { \
    search { customers(input: {}, first: $first, after: $after) { \
    pageInfo { hasNextPage endCursor } \
    edges { node { id legacyId firstName lastName email company phoneNumber createdAt } } } } }";

const SEARCH_TRANSACTIONS: &str = "query SearchTransactions($first: Int!, $after: String) { \
    search { transactions(input: {}, first: $first, after: $after) { \
    pageInfo { hasNextPage endCursor } \
    edges { node { id legacyId status createdAt amount { value currencyCode } \
    customer { id } } } } } }";

const CREATE_CUSTOMER: &str = "mutation CreateCustomer($input: CreateCustomerInput!) { \
    createCustomer(input: $input) { customer { id legacyId email createdAt } } }";

const UPDATE_CUSTOMER: &str = "mutation UpdateCustomer($input: UpdateCustomerInput!) { \
    updateCustomer(input: $input) { customer { id legacyId email createdAt } } }";

const DELETE_CUSTOMER: &str = "mutation DeleteCustomer($input: DeleteCustomerInput!) { \
    deleteCustomer(input: $input) { clientMutationId } }";

pub(super) fn binding(resolved: &ResolvedParams) -> Result<Box<dyn ProviderBinding>> {
    let endpoint = UrlBuilder::new(&resolved.base_url, &["graphql"])?.to_string();
    Ok(Box::new(Braintree {
        handler: Arc::new(BraintreeHandler { endpoint }),
    }))
}

struct Braintree {
    handler: Arc<BraintreeHandler>,
}

impl ProviderBinding for Braintree {
    fn endpoints(&self) -> BTreeMap<ModuleId, Vec<EndpointEntry>> {
        BTreeMap::from([(
            ROOT_MODULE.to_string(),
            vec![
                EndpointEntry::new("customers", Support::ALL),
                EndpointEntry::new("transactions", Support::READ),
            ],
        )])
    }

    fn error_handler(&self) -> Arc<dyn ErrorHandler> {
        Arc::new(GraphqlErrors::default())
    }

    fn default_headers(&self) -> Vec<(&'static str, String)> {
        vec![("Braintree-Version", API_VERSION.to_string())]
    }

    fn read_handler(&self) -> Option<Arc<dyn ReadHandler>> {
        Some(Arc::clone(&self.handler) as Arc<dyn ReadHandler>)
    }

    fn write_handler(&self) -> Option<Arc<dyn WriteHandler>> {
        Some(Arc::clone(&self.handler) as Arc<dyn WriteHandler>)
    }

    fn delete_handler(&self) -> Option<Arc<dyn DeleteHandler>> {
        Some(Arc::clone(&self.handler) as Arc<dyn DeleteHandler>)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Status-driven interpretation plus the GraphQL `errors` array on 200s
struct GraphqlErrors {
    status: ErrorInterpreter,
    errors: FormatSwitch,
}

impl Default for GraphqlErrors {
    fn default() -> Self {
        Self {
            status: ErrorInterpreter::default(),
            errors: FormatSwitch::new(vec![Template::new::<ErrorList>(&["errors"])]),
        }
    }
}

impl ErrorHandler for GraphqlErrors {
    fn handle(&self, status: u16, headers: &HeaderMap, body: &[u8]) -> Error {
        self.status.handle(status, headers, body)
    }

    fn inspect_success(&self, response: &HttpResponse) -> Result<()> {
        let Some(body) = response.body().ok().flatten() else {
            return Ok(());
        };
        let failed = body
            .get("errors")
            .and_then(JsonValue::as_array)
            .is_some_and(|errors| !errors.is_empty());
        if !failed {
            return Ok(());
        }

        let message = self
            .errors
            .describe(body)
            .unwrap_or_else(|| "GraphQL request failed".to_string());
        Err(Error::with_message(ErrorKind::BadRequest, message))
    }
}

// ============================================================================
// Handlers
// ============================================================================

struct BraintreeHandler {
    endpoint: String,
}

impl BraintreeHandler {
    fn graphql(&self, query: &str, variables: JsonValue) -> HttpRequest {
        HttpRequest::post(self.endpoint.clone()).json(json!({
            "query": query,
            "variables": variables,
        }))
    }
}

fn search_query(object: &str) -> Result<&'static str> {
    match object {
        "customers" => Ok(SEARCH_CUSTOMERS),
        "transactions" => Ok(SEARCH_TRANSACTIONS),
        other => Err(Error::with_message(
            ErrorKind::ObjectNotSupported,
            other.to_string(),
        )),
    }
}

impl ReadHandler for BraintreeHandler {
    fn build_request(&self, ctx: &ReadContext<'_>) -> Result<HttpRequest> {
        let query = search_query(ctx.object())?;
        let mut variables = json!({ "first": ctx.page_size.unwrap_or(DEFAULT_PAGE_SIZE) });
        if let Some(after) = ctx.next_page() {
            variables["after"] = JsonValue::String(after.to_string());
        }
        Ok(self.graphql(query, variables))
    }

    fn parse_response(
        &self,
        ctx: &ReadContext<'_>,
        request_url: &str,
        response: &HttpResponse,
    ) -> Result<ReadPage> {
        let connection = ["data", "search", ctx.object()];
        let page_info = ["data", "search", ctx.object(), "pageInfo"];
        parse_page(
            &RecordLocator::edges(&connection),
            &RelayPaginator::new(&page_info),
            ctx,
            request_url,
            response,
        )
    }

    fn default_page_size(&self, _object: &str) -> Option<u32> {
        Some(DEFAULT_PAGE_SIZE)
    }
}

impl WriteHandler for BraintreeHandler {
    fn build_request(&self, ctx: &WriteContext<'_>) -> Result<HttpRequest> {
        let customer = JsonValue::Object(ctx.object_data()?);
        Ok(match ctx.method {
            WriteMethod::Create => {
                self.graphql(CREATE_CUSTOMER, json!({ "input": { "customer": customer } }))
            }
            WriteMethod::Update(id) => self.graphql(
                UPDATE_CUSTOMER,
                json!({ "input": { "customerId": id, "customer": customer } }),
            ),
        })
    }

    fn parse_response(&self, ctx: &WriteContext<'_>, response: &HttpResponse) -> Result<WriteResult> {
        let mutation = if ctx.is_update() {
            "updateCustomer"
        } else {
            "createCustomer"
        };
        let body = response.body_required()?;
        let customer = JsonQuery::new(body)
            .zoom(&["data", mutation])
            .object_optional("customer")?;

        let record_id = customer
            .and_then(|c| c.get("id"))
            .and_then(JsonValue::as_str)
            .map(String::from)
            .or_else(|| ctx.record_id().map(String::from));
        Ok(WriteResult::success(record_id, customer.cloned()))
    }
}

impl DeleteHandler for BraintreeHandler {
    fn build_request(&self, ctx: &DeleteContext<'_>) -> Result<HttpRequest> {
        Ok(self.graphql(
            DELETE_CUSTOMER,
            json!({ "input": { "customerId": ctx.record_id } }),
        ))
    }

    fn parse_response(&self, _ctx: &DeleteContext<'_>, _response: &HttpResponse) -> Result<DeleteResult> {
        // GraphQL errors were already raised by the error handler
        Ok(DeleteResult { success: true })
    }
}
