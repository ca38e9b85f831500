use sodapi::{Body, Client, ClientConfig, Metadata, Params};
use tracing_subscriber::EnvFilter;

fn main() -> sodapi::Result<()> {
    // Example program that calls the library API.
    // Set SODAPY_APPTOKEN to avoid the stricter anonymous rate limits.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = ClientConfig::new("data.cityofnewyork.us");
    config.app_token = std::env::var("SODAPY_APPTOKEN").ok();

    Client::scoped(config, |client| {
        let dataset = "nu7n-tubp";

        if let Metadata::Dataset(meta) = client.get_metadata(Some(dataset))? {
            println!("dataset: {}", meta["name"]);
        }

        let params = Params::new()
            .set("select", "animalname, breedname")
            .set("where", "animalbirth > 2015")
            .set("limit", 6);
        if let Body::Rows(rows) = client.get(dataset, "csv", &params)?.body {
            for row in rows {
                println!("{}", row.join(" | "));
            }
        }

        let poodles = Params::new().filter("breedname", "Poodle, Standard").set("limit", 500);
        let count = client
            .get_all(dataset, &poodles)?
            .take(2000)
            .collect::<sodapi::Result<Vec<_>>>()?
            .len();
        println!("standard poodles (first 2000 max): {}", count);

        let catalog = client.datasets(
            &Params::new()
                .set("q", "dogs")
                .set("only", ["dataset"])
                .set("limit", 5),
        )?;
        println!("catalog matches: {}", catalog["resultSetSize"]);
        Ok(())
    })
}
