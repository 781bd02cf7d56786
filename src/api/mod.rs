use rocket::Route;

mod commissioner;
mod public;
mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(commissioner::routes());
    routes.extend(public::routes());
    routes.extend(voter::routes());
    routes
}
