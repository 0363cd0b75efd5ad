mod common;

use std::io::Write;

use common::{body, call};
use oxide_glob_router::runner::ControllerFactory;
use oxide_glob_router::{handler, DelegateRunner, Request, Response, Router, RouterConfig};

#[tokio::test]
async fn test_router_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "base_path": "/shop",
            "method_not_allowed": 405,
            "catch_errors": true,
            "routes": {{
                "/products/# +GET": {{"controller": "product", "id": "$2"}},
                "/products/** +GET": {{"controller": "catalog"}}
            }}
        }}"#
    )
    .unwrap();

    let product = handler(|req: Request, res: Response| async move {
        let id = req.route().and_then(|r| r.get_str("id")).unwrap_or_default().to_string();
        Ok(res.body(format!("product {id}")))
    });
    let catalog = handler(|_req, res: Response| async move { Ok(res.body("catalog")) });
    let runner = DelegateRunner::new().with_controllers(
        ControllerFactory::new()
            .register("ProductController", product)
            .register("CatalogController", catalog),
    );

    let config = RouterConfig::load(file.path()).unwrap();
    let router = Router::from_config(config, runner).unwrap();
    assert_eq!(router.middlewares(), 4);

    let res = call(&router, Request::get("/shop/products/12")).await;
    assert_eq!(body(&res), "product 12");

    let res = call(&router, Request::get("/shop/products/shoes/red")).await;
    assert_eq!(body(&res), "catalog");

    let res = call(&router, Request::post("/shop/products/12")).await;
    assert_eq!(res.status, 405);

    let res = call(&router, Request::get("/products/12")).await;
    assert_eq!(res.status, 404);
}

#[test]
fn test_invalid_routes_fail_at_startup() {
    let config = RouterConfig::from_json(r#"{"routes": {"/foo +FETCH": {}}}"#).unwrap();
    let err = Router::from_config(config, DelegateRunner::new()).err().unwrap();
    assert!(err.is_configuration());

    let config = RouterConfig::from_json(r#"{"routes": {"/foo": {"path": "$1..."}}}"#).unwrap();
    let err = Router::from_config(config, DelegateRunner::new()).err().unwrap();
    assert!(err.is_configuration());
}
