use reqwest::Client;

const DISABLE_SYSTEM_PROXY_ENV: &str = "CAMPCHAT_DISABLE_SYSTEM_PROXY";

pub(crate) fn build_http_client() -> reqwest::Result<Client> {
    if should_disable_system_proxy() {
        Client::builder().no_proxy().build()
    } else {
        Client::builder().build()
    }
}

fn should_disable_system_proxy() -> bool {
    if std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() {
        return true;
    }

    cfg!(test)
}
