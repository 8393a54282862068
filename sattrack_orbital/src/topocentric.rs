/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! earth fixed frame conversion and look angles (azimuth, elevation, range) from ground stations

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Serialize,Deserialize};
use satkit::{frametransform::qteme2itrf, itrfcoord::ITRFCoord};
use sattrack_common::normalize_360;

use crate::timescale::instant_from_datetime;

/// rad/s
const EARTH_ROTATION_RATE: f64 = 7.292115e-5;

/// a receiving ground station. Coordinates are geodetic (WGS-84) in degrees, altitude in meters
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct GroundStation {
    pub name: String,

    #[serde(default="default_latitude")]
    pub latitude: f64,

    #[serde(default="default_longitude")]
    pub longitude: f64,

    #[serde(default="default_altitude")]
    pub altitude: f64,

    #[serde(default="default_minimum_elevation")]
    pub minimum_elevation: f64,

    /// catalog ids of the objects this station observes
    #[serde(default)]
    pub satellites: Vec<u32>,
}

fn default_latitude ()->f64 { 45.0 }
fn default_longitude ()->f64 { 2.0 }
fn default_altitude ()->f64 { 100.0 }
fn default_minimum_elevation ()->f64 { 10.0 }

impl GroundStation {
    pub fn new (name: impl ToString, latitude: f64, longitude: f64, altitude: f64, minimum_elevation: f64, satellites: Vec<u32>)->Self {
        GroundStation { name: name.to_string(), latitude, longitude, altitude, minimum_elevation, satellites }
    }

    pub fn observes (&self, catalog_id: u32)->bool {
        self.satellites.contains(&catalog_id)
    }

    pub fn itrf_coord (&self)->ITRFCoord {
        ITRFCoord::from_geodetic_deg( self.latitude, self.longitude, self.altitude)
    }

    /// station position in ECEF [km]
    pub fn ecef_km (&self)->Vector3<f64> {
        self.itrf_coord().itrf / 1000.0
    }

    /// ECEF vector from station to object [km] in the local east-north-up frame
    fn to_enu (&self, rho: &Vector3<f64>)->Vector3<f64> {
        self.itrf_coord().q_enu2itrf().conjugate() * rho
    }

    /// look angle for a TEME state [km, km/s] at the given time
    pub fn look_angle (&self, t: &DateTime<Utc>, pos_teme: &Vector3<f64>, vel_teme: &Vector3<f64>)->LookAngle {
        let (pos, vel) = teme_to_ecef( t, pos_teme, vel_teme);

        let rho = pos - self.ecef_km();
        let range = rho.norm();
        let enu = self.to_enu( &rho);

        let azimuth = normalize_360( enu.x.atan2(enu.y).to_degrees());
        let elevation = (enu.z / range).clamp(-1.0, 1.0).asin().to_degrees();
        let range_rate = rho.dot(&vel) / range;

        LookAngle { station: self.name.clone(), azimuth, elevation, range, range_rate }
    }

    /// elevation [deg] only, for event searches
    pub fn elevation (&self, t: &DateTime<Utc>, pos_teme: &Vector3<f64>)->f64 {
        let rho = teme_to_ecef_position( t, pos_teme) - self.ecef_km();
        let up = self.to_enu( &rho).z;
        (up / rho.norm()).clamp(-1.0, 1.0).asin().to_degrees()
    }
}

/// topocentric view of an object from a ground station
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct LookAngle {
    pub station: String,
    pub azimuth: f64,    // [deg] clockwise from north
    pub elevation: f64,  // [deg]
    pub range: f64,      // [km]
    pub range_rate: f64, // [km/s] positive if receding
}

/// sub-satellite point
#[derive(Debug,Clone,Copy,Serialize,Deserialize,PartialEq)]
pub struct GeodeticPosition {
    pub latitude: f64,  // [deg]
    pub longitude: f64, // [deg]
    pub altitude: f64,  // [km]
}

impl GeodeticPosition {
    pub fn from_ecef_km (pos: &Vector3<f64>)->Self {
        let c = ITRFCoord::from_vector( &(pos * 1000.0));
        GeodeticPosition { latitude: c.latitude_deg(), longitude: c.longitude_deg(), altitude: c.hae() / 1000.0 }
    }
}

pub fn teme_to_ecef_position (t: &DateTime<Utc>, pos: &Vector3<f64>)->Vector3<f64> {
    qteme2itrf( &instant_from_datetime(t)).to_rotation_matrix() * pos
}

/// rotate a TEME state into the earth fixed frame
pub fn teme_to_ecef (t: &DateTime<Utc>, pos: &Vector3<f64>, vel: &Vector3<f64>)->(Vector3<f64>,Vector3<f64>) {
    let rot = qteme2itrf( &instant_from_datetime(t)).to_rotation_matrix();
    let omega = Vector3::new( 0.0, 0.0, EARTH_ROTATION_RATE);

    let p = rot * pos;
    let v = rot * vel - omega.cross(&p);
    (p, v)
}
