/// Main application entry point for Menu Deal Moço.
/// Shows the featured lunch menus and the reviews of the selected restaurant.
use leptos::*;
use leptos_meta::*;
use leptos_router::*;

use crate::components::{restaurants_list::RestaurantsList, reviews_list::ReviewsList};
use crate::models::Review;
use crate::search::RestaurantHit;

const FEATURED_ON_HOME: usize = 6;

#[server(FeaturedRestaurants, "/sfn")]
pub async fn featured_restaurants() -> Result<Vec<RestaurantHit>, ServerFnError> {
    use crate::api::AppState;
    use crate::error::AppError;

    let state = use_context::<AppState>()
        .ok_or_else(|| AppError::Internal("application state missing".to_string()))
        .map_err(AppError::into_server_fn_error)?;
    let restaurants = state
        .db
        .list_restaurants()
        .await
        .map_err(AppError::into_server_fn_error)?;
    let now = chrono::Local::now().naive_local();
    Ok(crate::search::featured(&restaurants, FEATURED_ON_HOME)
        .into_iter()
        .map(|r| RestaurantHit::new(r.clone(), None, now))
        .collect())
}

#[server(RestaurantReviews, "/sfn")]
pub async fn restaurant_reviews(restaurant_id: i64, sort: String) -> Result<Vec<Review>, ServerFnError> {
    use crate::api::AppState;
    use crate::error::AppError;
    use crate::review_sorting::{sort_reviews, ReviewSort};

    let state = use_context::<AppState>()
        .ok_or_else(|| AppError::Internal("application state missing".to_string()))
        .map_err(AppError::into_server_fn_error)?;
    let mut reviews = state
        .db
        .list_reviews(restaurant_id, None)
        .await
        .map_err(AppError::into_server_fn_error)?;
    sort_reviews(&mut reviews, ReviewSort::from_param(&sort));
    Ok(reviews)
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Menu Deal Moço"/>
        <Router>
            <main>
                <Routes>
                    <Route path="" view=HomePage/>
                    <Route path="/*any" view=NotFound/>
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn HomePage() -> impl IntoView {
    let (selected, set_selected) = create_signal(None::<i64>);
    let (sort, set_sort) = create_signal("recent".to_string());

    let featured = create_resource(|| (), |_| featured_restaurants());
    let reviews = create_resource(
        move || (selected.get(), sort.get()),
        |(restaurant_id, sort)| async move {
            match restaurant_id {
                Some(id) => restaurant_reviews(id, sort).await,
                None => Ok(Vec::new()),
            }
        },
    );

    view! {
        <h1>"Menu Deal Moço"</h1>
        <h2>"Menus de almoço em destaque"</h2>
        <Suspense fallback=|| view! { <p>"A carregar..."</p> }>
            {move || featured.get().map(|result| match result {
                Ok(hits) => view! {
                    <RestaurantsList restaurants=hits on_select=move |id| set_selected.set(Some(id))/>
                }.into_view(),
                Err(e) => view! { <p class="error">{e.to_string()}</p> }.into_view(),
            })}
        </Suspense>
        <Show when=move || selected.get().is_some()>
            <h2>"Avaliações do menu"</h2>
            <select on:change=move |ev| set_sort.set(event_target_value(&ev))>
                <option value="recent">"Mais recentes"</option>
                <option value="upvotes">"Mais úteis"</option>
                <option value="rating">"Melhor nota"</option>
                <option value="lowestRating">"Pior nota"</option>
                <option value="controversial">"Mais controversas"</option>
            </select>
            <Suspense fallback=|| view! { <p>"A carregar..."</p> }>
                {move || reviews.get().map(|result| match result {
                    Ok(list) => view! { <ReviewsList reviews=list/> }.into_view(),
                    Err(e) => view! { <p class="error">{e.to_string()}</p> }.into_view(),
                })}
            </Suspense>
        </Show>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! { <h1>"Página não encontrada"</h1> }
}
