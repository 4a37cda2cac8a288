/// Component to display a list of restaurant cards.
/// Each card shows the menu price, rating and whether the place is open right now.
use leptos::*;
use crate::search::RestaurantHit;

fn rating_label(hit: &RestaurantHit) -> String {
    match hit.restaurant.display_rating() {
        Some(rating) => format!("★ {rating:.1} ({})", hit.restaurant.total_reviews()),
        None => "Sem avaliações".to_string(),
    }
}

#[component]
pub fn RestaurantsList(
    restaurants: Vec<RestaurantHit>,
    #[prop(into)] on_select: Callback<i64>,
) -> impl IntoView {
    if restaurants.is_empty() {
        return view! { <p>"Nenhum restaurante encontrado."</p> }.into_view();
    }

    view! {
        <ul class="restaurants">
            {restaurants
                .into_iter()
                .map(|hit| {
                    let id = hit.restaurant.id;
                    let rating = rating_label(&hit);
                    let price = format!("{:.2} € · {}", hit.restaurant.menu_price, hit.price_category.label());
                    let place = format!("{} · {}", hit.restaurant.food_type, hit.restaurant.city);
                    view! {
                        <li class="restaurant-card" on:click=move |_| on_select.call(id)>
                            <h3>{hit.restaurant.name}</h3>
                            <p>{place}</p>
                            <p>{price}</p>
                            <p>{rating}</p>
                            {hit.is_open_now.then(|| view! { <span class="open">"Aberto agora"</span> })}
                        </li>
                    }
                })
                .collect_view()}
        </ul>
    }
    .into_view()
}
