//! MCP server implementation over the catalog repositories.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use storeagent_core::domain::order::{NewOrder, Order, OrderId};
use storeagent_core::domain::product::{NewProduct, Product, ProductId, ProductStatistics};
use storeagent_db::repositories::{
    OrderRepository, ProductRepository, SqlOrderRepository, SqlProductRepository,
};
use storeagent_db::DbPool;

use crate::{ToolFailure, ToolResult};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListProductsInput {
    #[schemars(description = "Only return products in this category (case-insensitive)")]
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetProductInput {
    #[schemars(description = "Product id")]
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddProductInput {
    pub name: String,
    #[schemars(description = "Unit price, must be >= 0")]
    pub price: f64,
    pub category: String,
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateOrderInput {
    pub product_id: i64,
    #[schemars(description = "Number of units, must be > 0")]
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetOrderInput {
    #[schemars(description = "Order id")]
    pub id: i64,
}

/// Catalog and order tools served over MCP.
#[derive(Clone)]
pub struct StoreMcpServer {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    tool_router: ToolRouter<Self>,
}

impl StoreMcpServer {
    pub fn new(products: Arc<dyn ProductRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { products, orders, tool_router: Self::tool_router() }
    }

    pub fn with_pool(pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqlProductRepository::new(pool.clone())),
            Arc::new(SqlOrderRepository::new(pool)),
        )
    }

    /// Serves MCP over this process's stdin/stdout until the client disconnects.
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        info!(event_name = "mcp.server.starting", "starting MCP server with stdio transport");

        let service = self.serve(rmcp::transport::stdio()).await?;
        let quit_reason = service.waiting().await?;

        info!(event_name = "mcp.server.stopped", reason = ?quit_reason, "MCP server shut down");
        Ok(())
    }

    async fn find_product(&self, id: i64) -> ToolResult<Product> {
        self.products
            .find_by_id(ProductId(id))
            .await?
            .ok_or_else(|| ToolFailure::NotFound(format!("Product with id={id} not found")))
    }

    async fn insert_product(&self, input: AddProductInput) -> ToolResult<Product> {
        let product = NewProduct::new(input.name, input.price, input.category, input.in_stock)?;
        Ok(self.products.insert(product).await?)
    }

    async fn statistics(&self) -> ToolResult<ProductStatistics> {
        Ok(self.products.statistics().await?)
    }

    async fn place_order(&self, input: CreateOrderInput) -> ToolResult<Order> {
        let order = NewOrder::new(ProductId(input.product_id), input.quantity)?;
        Ok(self.orders.create(order).await?)
    }

    async fn find_order(&self, id: i64) -> ToolResult<Order> {
        self.orders
            .find_by_id(OrderId(id))
            .await?
            .ok_or_else(|| ToolFailure::NotFound(format!("Order with id={id} not found")))
    }
}

#[tool_router]
impl StoreMcpServer {
    #[tool(description = "List products ordered by id, optionally filtered by category")]
    async fn list_products(
        &self,
        Parameters(input): Parameters<ListProductsInput>,
    ) -> Result<CallToolResult, McpError> {
        let category = input.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
        info!(event_name = "mcp.tool.list_products", category = ?category, "list_products called");

        let outcome = self.products.list(category).await.map_err(ToolFailure::from);
        respond("list_products", outcome)
    }

    #[tool(description = "Get one product by id")]
    async fn get_product(
        &self,
        Parameters(input): Parameters<GetProductInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(event_name = "mcp.tool.get_product", product_id = input.id, "get_product called");
        respond("get_product", self.find_product(input.id).await)
    }

    #[tool(description = "Add a product to the catalog and return it with its new id")]
    async fn add_product(
        &self,
        Parameters(input): Parameters<AddProductInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(event_name = "mcp.tool.add_product", name = %input.name, "add_product called");
        respond("add_product", self.insert_product(input).await)
    }

    #[tool(description = "Count, average, minimum and maximum price over all products")]
    async fn get_statistics(&self) -> Result<CallToolResult, McpError> {
        info!(event_name = "mcp.tool.get_statistics", "get_statistics called");
        respond("get_statistics", self.statistics().await)
    }

    #[tool(description = "Create an order for a product; total is price times quantity")]
    async fn create_order(
        &self,
        Parameters(input): Parameters<CreateOrderInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            event_name = "mcp.tool.create_order",
            product_id = input.product_id,
            quantity = input.quantity,
            "create_order called"
        );
        respond("create_order", self.place_order(input).await)
    }

    #[tool(description = "Get one order by id")]
    async fn get_order(
        &self,
        Parameters(input): Parameters<GetOrderInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(event_name = "mcp.tool.get_order", order_id = input.id, "get_order called");
        respond("get_order", self.find_order(input.id).await)
    }

    #[tool(description = "List all orders, newest first")]
    async fn list_orders(&self) -> Result<CallToolResult, McpError> {
        info!(event_name = "mcp.tool.list_orders", "list_orders called");
        let outcome = self.orders.list().await.map_err(ToolFailure::from);
        respond("list_orders", outcome)
    }
}

#[tool_handler]
impl ServerHandler for StoreMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Storeagent catalog server. Tools return JSON text; failures carry an `error` field."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

/// Wraps a tool outcome as a single JSON text block.
fn respond<T: Serialize>(tool: &str, outcome: ToolResult<T>) -> Result<CallToolResult, McpError> {
    let body = match outcome {
        Ok(value) => serde_json::to_value(value)
            .map_err(|error| McpError::internal_error(error.to_string(), None))?,
        Err(failure) => {
            warn!(event_name = "mcp.tool.failed", tool, error = %failure, "tool reported failure");
            json!({ "error": failure.to_string() })
        }
    };
    Ok(CallToolResult::success(vec![Content::text(body.to_string())]))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rmcp::handler::server::wrapper::Parameters;
    use rmcp::model::CallToolResult;
    use rmcp::ServerHandler;
    use serde_json::{json, Value};

    use storeagent_db::repositories::{InMemoryOrderRepository, InMemoryProductRepository};
    use storeagent_db::DemoCatalog;

    use super::{
        AddProductInput, CreateOrderInput, GetOrderInput, GetProductInput, ListProductsInput,
        StoreMcpServer,
    };

    async fn seeded_server() -> StoreMcpServer {
        let products = Arc::new(InMemoryProductRepository::default());
        DemoCatalog::seed_if_empty(products.as_ref()).await.expect("seed");
        let orders = Arc::new(InMemoryOrderRepository::new(Arc::clone(&products)));
        StoreMcpServer::new(products, orders)
    }

    fn body(result: CallToolResult) -> Value {
        let envelope = serde_json::to_value(&result).expect("serialize result");
        let text = envelope["content"][0]["text"].as_str().expect("text block");
        serde_json::from_str(text).expect("json body")
    }

    #[tokio::test]
    async fn server_advertises_tools() {
        let server = seeded_server().await;
        assert!(server.get_info().capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn list_products_filters_by_category() {
        let server = seeded_server().await;

        let all = body(server.list_products(Parameters(ListProductsInput::default())).await.unwrap());
        assert_eq!(all.as_array().map(Vec::len), Some(3));

        let input = ListProductsInput { category: Some(" электроника ".to_string()) };
        let electronics = body(server.list_products(Parameters(input)).await.unwrap());
        let names = electronics
            .as_array()
            .expect("array")
            .iter()
            .map(|p| p["name"].as_str().unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Ноутбук", "Мышка"]);

        let blank = ListProductsInput { category: Some("  ".to_string()) };
        assert_eq!(body(server.list_products(Parameters(blank)).await.unwrap()), all);
    }

    #[tokio::test]
    async fn get_product_reports_missing_id() {
        let server = seeded_server().await;

        let laptop = body(server.get_product(Parameters(GetProductInput { id: 1 })).await.unwrap());
        assert_eq!(laptop["price"], json!(50000.0));

        let missing = body(server.get_product(Parameters(GetProductInput { id: 99 })).await.unwrap());
        assert_eq!(missing, json!({"error": "Product with id=99 not found"}));
    }

    #[tokio::test]
    async fn add_product_validates_and_assigns_next_id() {
        let server = seeded_server().await;

        let input = AddProductInput {
            name: "Чай".to_string(),
            price: 300.0,
            category: "Продукты".to_string(),
            in_stock: true,
        };
        let created = body(server.add_product(Parameters(input)).await.unwrap());
        assert_eq!(created["id"], json!(4));

        let negative = AddProductInput {
            name: "Чай".to_string(),
            price: -1.0,
            category: "Продукты".to_string(),
            in_stock: true,
        };
        assert_eq!(
            body(server.add_product(Parameters(negative)).await.unwrap()),
            json!({"error": "price must be >= 0"})
        );

        let unnamed = AddProductInput {
            name: " ".to_string(),
            price: 1.0,
            category: "Продукты".to_string(),
            in_stock: true,
        };
        assert_eq!(
            body(server.add_product(Parameters(unnamed)).await.unwrap()),
            json!({"error": "name and category are required"})
        );
    }

    #[tokio::test]
    async fn statistics_cover_seeded_catalog() {
        let server = seeded_server().await;
        let stats = body(server.get_statistics().await.unwrap());

        assert_eq!(stats["count"], json!(3));
        assert_eq!(stats["min_price"], json!(1200.0));
        assert_eq!(stats["max_price"], json!(50000.0));
    }

    #[tokio::test]
    async fn orders_are_created_listed_and_fetched() {
        let server = seeded_server().await;

        let order = body(
            server
                .create_order(Parameters(CreateOrderInput { product_id: 2, quantity: 3 }))
                .await
                .unwrap(),
        );
        assert_eq!(order["total_price"], json!(4500.0));

        let fetched = body(server.get_order(Parameters(GetOrderInput { id: 1 })).await.unwrap());
        assert_eq!(fetched["product_id"], json!(2));

        let listed = body(server.list_orders().await.unwrap());
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let rejected = body(
            server
                .create_order(Parameters(CreateOrderInput { product_id: 2, quantity: 0 }))
                .await
                .unwrap(),
        );
        assert_eq!(rejected, json!({"error": "quantity must be > 0"}));

        let unknown = body(
            server
                .create_order(Parameters(CreateOrderInput { product_id: 77, quantity: 1 }))
                .await
                .unwrap(),
        );
        assert_eq!(unknown, json!({"error": "Product with id=77 not found"}));

        let missing = body(server.get_order(Parameters(GetOrderInput { id: 5 })).await.unwrap());
        assert_eq!(missing, json!({"error": "Order with id=5 not found"}));
    }
}
