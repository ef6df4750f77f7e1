//! Special functions: Bessel J1, complex sinc, error function, quadrature.

use num_complex::Complex64;

/// Bessel function of the first kind, order one, for real argument.
///
/// Rational approximation for |x| < 8 and asymptotic expansion beyond,
/// accurate to about 1e-8.
pub fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let num = x
            * (72362614232.0
                + y * (-7895059235.0
                    + y * (242396853.1
                        + y * (-2972611.439 + y * (15704.48260 + y * (-30.16036606))))));
        let den = 144725228442.0
            + y * (2300535178.0
                + y * (18583304.74 + y * (99447.43394 + y * (376.9991397 + y))));
        num / den
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        let xx = ax - 2.356194491;
        let p = 1.0
            + y * (0.183105e-2
                + y * (-0.3516396496e-4 + y * (0.2457520174e-5 + y * (-0.240337019e-6))));
        let q = 0.04687499995
            + y * (-0.2002690873e-3
                + y * (0.8449199096e-5 + y * (-0.88228987e-6 + y * 0.105787412e-6)));
        let ans = (0.636619772 / ax).sqrt() * (xx.cos() * p - z * xx.sin() * q);
        if x < 0.0 {
            -ans
        } else {
            ans
        }
    }
}

/// J1(x)/x with the x → 0 limit of 1/2.
pub fn j1_over_x(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        0.5
    } else {
        bessel_j1(x) / x
    }
}

/// sin(z)/z for complex z.
pub fn sinc(z: Complex64) -> Complex64 {
    if z.norm() < 1e-9 {
        Complex64::new(1.0, 0.0) - z * z / 6.0
    } else {
        z.sin() / z
    }
}

/// Error function (Abramowitz & Stegun 7.1.26, |error| < 1.5e-7).
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Cumulative distribution function of the standard normal distribution.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Composite Simpson integration of a complex integrand over [a, b].
///
/// `intervals` is rounded up to the next even number.
pub fn simpson<F>(f: F, a: f64, b: f64, intervals: usize) -> Complex64
where
    F: Fn(f64) -> Complex64,
{
    let n = (intervals.max(2) + 1) & !1;
    let h = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for i in 1..n {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += f(a + i as f64 * h) * weight;
    }
    sum * (h / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bessel_j1_values() {
        assert_relative_eq!(bessel_j1(1.0), 0.4400505857, epsilon = 1e-7);
        assert_relative_eq!(bessel_j1(5.0), -0.3275791376, epsilon = 1e-7);
        assert_relative_eq!(bessel_j1(10.0), 0.0434727462, epsilon = 1e-6);
        assert_relative_eq!(bessel_j1(-1.0), -0.4400505857, epsilon = 1e-7);
    }

    #[test]
    fn test_j1_over_x_limit() {
        assert_eq!(j1_over_x(0.0), 0.5);
        assert_relative_eq!(j1_over_x(1e-6), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_sinc() {
        assert_relative_eq!(sinc(Complex64::new(0.0, 0.0)).re, 1.0);
        let v = sinc(Complex64::new(std::f64::consts::PI, 0.0));
        assert!(v.norm() < 1e-12);
    }

    #[test]
    fn test_erf() {
        assert_relative_eq!(erf(0.0), 0.0, epsilon = 1e-7);
        assert_relative_eq!(erf(1.0), 0.8427007929, epsilon = 2e-7);
        assert_relative_eq!(erf(-1.0), -0.8427007929, epsilon = 2e-7);
        assert_relative_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-7);
    }

    #[test]
    fn test_simpson_polynomial() {
        let v = simpson(|x| Complex64::new(x * x, 0.0), 0.0, 3.0, 10);
        assert_relative_eq!(v.re, 9.0, epsilon = 1e-12);
    }
}
