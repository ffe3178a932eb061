use std::time::Duration;

use tokio::sync::oneshot;

use crate::helpers::TestApp;

#[tokio::test]
async fn server_stops_after_shutdown_signal() {
    let (stop, stopped) = oneshot::channel::<()>();
    let (app, server) = TestApp::start(async move {
        let _ = stopped.await;
    })
    .await;

    let login = || {
        reqwest::Client::new()
            .post(format!("{}/api/auth/login", app.address))
            .json(&serde_json::json!({ "username": "nobody", "password": "Abcdef1!" }))
            .send()
    };

    let response = login().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
    drop(response);

    stop.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop in time")
        .unwrap();
    assert!(result.is_ok());

    assert!(login().await.is_err());
}
