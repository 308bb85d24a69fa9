//! Opportunity, order and product conversions.

use crate::{order_status_from_planet, ConvertError};
use chrono::DateTime;
use stapi_types::planet::{
    provider_planet, OffNadirAngleRange, PlanetOpportunityProperties, PlanetOrderParameters,
    SatelliteType,
};
use stapi_types::vendor::{
    CreateOrderRequest, ImagingWindow, ImagingWindowSearch, PlanetOrder, PlanetProduct,
};
use stapi_types::{
    DatetimeInterval, JsonObject, Link, Opportunity, OpportunityPayload, OpportunityProperties,
    Order, OrderPayload, OrderProperties, OrderSearchParameters, Product, ValidationError, CORE,
    OPPORTUNITIES, TYPE_JSON,
};

/// Planet order fields copied into STAPI `order_parameters` when present.
pub const ORDER_FIELDS_TO_PROPERTIES: [&str; 4] =
    ["pl_number", "satelite_types", "name", "scheduling_type"];

pub const ASSURED_TASKING: &str = "Assured Tasking";

/// Split `"<pl_number>:<product>"`.
pub fn split_product_id(product_id: &str) -> Result<(&str, &str), ConvertError> {
    match product_id.split_once(':') {
        Some((pl, product)) if !pl.is_empty() && !product.is_empty() && !product.contains(':') => {
            Ok((pl, product))
        }
        _ => Err(ConvertError::InvalidProductId(product_id.to_string())),
    }
}

/// The single product this adapter serves for a Planet contract.
pub fn assured_tasking_product(pl_number: &str) -> Product {
    let id = format!("{}:{}", pl_number, ASSURED_TASKING);
    Product {
        kind: "Product".to_string(),
        conforms_to: vec![CORE.to_string(), OPPORTUNITIES.to_string()],
        title: id.clone(),
        id,
        description: "Assured SkySat Tasking".to_string(),
        keywords: vec!["satellite".to_string(), "provider".to_string()],
        license: "proprietary".to_string(),
        providers: vec![provider_planet()],
        links: Vec::new(),
    }
}

pub fn planet_product_to_stapi_product(planet_product: &PlanetProduct) -> Product {
    Product {
        kind: "Product".to_string(),
        conforms_to: vec![CORE.to_string(), OPPORTUNITIES.to_string()],
        id: format!("{}:{}", planet_product.pl_number, planet_product.product),
        title: planet_product.product.clone(),
        description: planet_product.product.clone(),
        keywords: vec!["satellite".to_string()],
        license: "proprietary".to_string(),
        providers: vec![provider_planet()],
        links: Vec::new(),
    }
}

/// STAPI opportunity search -> Planet imaging-window search job request.
pub fn opportunity_payload_to_iw_search(
    product: &Product,
    search: &OpportunityPayload,
) -> Result<ImagingWindowSearch, ConvertError> {
    let (pl_number, pl_product) = split_product_id(&product.id)?;
    Ok(ImagingWindowSearch {
        datetime: search.datetime.to_string(),
        pl_number: pl_number.to_string(),
        product: pl_product.to_string(),
        geometry: search.geometry.clone(),
    })
}

/// Order payload embedded in an opportunity's create-order link.
pub fn iw_to_order_payload(
    iw: &ImagingWindow,
    search: &OpportunityPayload,
) -> Result<OrderPayload<PlanetOrderParameters>, ConvertError> {
    Ok(OrderPayload {
        datetime: DatetimeInterval::from_bounds(&iw.start_time, &iw.end_time)?,
        geometry: search.geometry.clone(),
        filter: None,
        order_parameters: PlanetOrderParameters {
            imaging_window_id: iw.id.clone(),
            name: format!(
                "{} at {}",
                iw.start_time,
                serde_json::to_string(&search.geometry.coordinates)?
            ),
        },
    })
}

pub fn iw_to_opportunity(
    iw: &ImagingWindow,
    product: &Product,
    search: &OpportunityPayload,
    create_href: &str,
) -> Result<Opportunity<PlanetOpportunityProperties>, ConvertError> {
    let cloud_forecast = iw
        .cloud_forecast
        .first()
        .and_then(|cf| cf.prediction)
        .unwrap_or(0.0);
    let properties = OpportunityProperties {
        product_id: product.id.clone(),
        datetime: DatetimeInterval::from_bounds(&iw.start_time, &iw.end_time)?,
        extra: PlanetOpportunityProperties {
            off_nadir_angle: OffNadirAngleRange::new(
                iw.off_nadir_angle_min,
                iw.off_nadir_angle_max,
            )?,
            satellite_type: iw.satellite_type.parse::<SatelliteType>()?,
            cloud_forecast,
        },
    };
    let order_body = iw_to_order_payload(iw, search)?;
    let link = Link {
        href: create_href.to_string(),
        rel: "create-order".to_string(),
        media_type: Some(TYPE_JSON.to_string()),
        title: Some("create-order".to_string()),
        method: Some("POST".to_string()),
        body: Some(serde_json::to_value(&order_body)?),
    };
    Ok(Opportunity {
        id: iw.id.clone(),
        kind: "Feature".to_string(),
        geometry: search.geometry.clone(),
        properties,
        links: vec![link],
    })
}

/// Planet tasking order -> STAPI order.
pub fn planet_order_to_stapi_order(planet_order: PlanetOrder) -> Result<Order, ConvertError> {
    let search_parameters = OrderSearchParameters {
        datetime: DatetimeInterval::from_bounds(
            &planet_order.start_time,
            &planet_order.end_time,
        )?,
        geometry: planet_order.original_geometry,
        filter: None,
    };
    let created = DateTime::parse_from_rfc3339(&planet_order.created_time).map_err(|e| {
        ValidationError::new(format!(
            "invalid created_time {:?}: {}",
            planet_order.created_time, e
        ))
    })?;

    let mut opportunity_properties = JsonObject::new();
    opportunity_properties.insert(
        "imaging_window".to_string(),
        planet_order
            .imaging_window
            .unwrap_or(serde_json::Value::Null),
    );
    let order_parameters: JsonObject = ORDER_FIELDS_TO_PROPERTIES
        .iter()
        .filter_map(|key| {
            planet_order
                .extra
                .get(*key)
                .map(|v| (key.to_string(), v.clone()))
        })
        .collect();

    Ok(Order {
        id: planet_order.id,
        kind: "Feature".to_string(),
        geometry: planet_order.geometry,
        properties: OrderProperties {
            product_id: planet_order.product.unwrap_or_default(),
            created,
            status: order_status_from_planet(&planet_order.status),
            search_parameters,
            opportunity_properties,
            order_parameters,
        },
        links: Vec::new(),
    })
}

/// STAPI order payload -> Planet create-order request (bbox dropped).
pub fn order_payload_to_create_order(
    payload: &OrderPayload<PlanetOrderParameters>,
    product: &Product,
) -> Result<CreateOrderRequest, ConvertError> {
    let (pl_number, pl_product) = split_product_id(&product.id)?;
    Ok(CreateOrderRequest {
        pl_number: pl_number.to_string(),
        product: pl_product.to_string(),
        imaging_window: payload.order_parameters.imaging_window_id.clone(),
        geometry: payload.geometry.without_bbox(),
        name: payload.order_parameters.name.clone(),
    })
}
