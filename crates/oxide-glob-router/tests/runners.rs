mod common;

use std::fs;

use common::{body, call, router_from};
use oxide_glob_router::runner::{controller_class, ControllerFactory, ScriptRunner};
use oxide_glob_router::{handler, DelegateRunner, Request, Response, RouterError};

#[test]
fn test_controller_names() {
    assert_eq!(controller_class(&["user"]), "UserController");
    assert_eq!(controller_class(&["user-profile"]), "UserProfileController");
    assert_eq!(controller_class(&["foo", "BAR", "zoo"]), "Foo::Bar::ZooController");
    assert_eq!(controller_class(&["foo--bar-zoo"]), "Foo--barZooController");
}

#[test]
fn test_controller_case_mismatch() {
    let factory = ControllerFactory::new().register(
        "UserprofileController",
        handler(|_req, res: Response| async move { Ok(res) }),
    );

    let err = factory.create(&["user-profile"]).err().unwrap();
    match err {
        RouterError::ControllerNotFound { name, reason } => {
            assert_eq!(name, "UserProfileController");
            assert_eq!(reason, "case mismatch with 'UserprofileController'");
        }
        other => panic!("Expected ControllerNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_script_routes() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("pages")).unwrap();
    fs::write(dir.path().join("pages/about.html"), "<h1>About</h1>").unwrap();

    let runner = DelegateRunner::new().with_scripts(ScriptRunner::new(dir.path()));
    let router = router_from(
        r#"{"routes": {
            "/pages/*": {"file": "~pages/~$2~.html~"},
            "/escape/*": {"file": "~../~$2~"}
        }}"#,
        runner,
    );

    let res = call(&router, Request::get("/pages/about")).await;
    assert_eq!(res.status, 200);
    assert_eq!(body(&res), "<h1>About</h1>");

    let res = call(&router, Request::get("/pages/contact")).await;
    assert_eq!(res.status, 404);

    let res = call(&router, Request::get("/escape/passwd")).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_script_handler() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("report.php"), "<?php echo 'report';").unwrap();

    let scripts =
        ScriptRunner::new(dir.path()).with_handler(|path, req: Request, res: Response| async move {
            let name = path.file_name().unwrap_or_default().to_string_lossy().into_owned();
            Ok(res.body(format!("ran {name} for {}", req.path)))
        });
    let router = router_from(
        r#"{"routes": {"/reports/**": {"file": "report.php"}}}"#,
        DelegateRunner::new().with_scripts(scripts),
    );

    let res = call(&router, Request::get("/reports/2024/q1")).await;
    assert_eq!(body(&res), "ran report.php for /reports/2024/q1");
}
