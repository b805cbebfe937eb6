use rocket::Route;

mod ballot;

pub fn routes() -> Vec<Route> {
    ballot::routes()
}
