pub mod auth;
pub mod health;
pub mod movies;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::signup)
            .service(auth::login),
    )
    .service(
        web::scope("/movies")
            .service(movies::list_movies)
            .service(movies::create_movie)
            .service(movies::update_nb_film)
            .service(movies::update_loc)
            .service(movies::get_movie)
            .service(movies::update_movie)
            .service(movies::delete_movie),
    );
}
